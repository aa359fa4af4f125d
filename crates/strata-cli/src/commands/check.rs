use std::path::Path;

use console::style;
use miette::Result;

use strata_core::check::{check_template_repository, CheckResult, Severity};

pub fn run(path: String) -> Result<()> {
    let repository_dir = Path::new(&path);
    let result = check_template_repository(repository_dir)?;

    let name = if result.repository_name.is_empty() {
        repository_dir.display().to_string()
    } else {
        result.repository_name.clone()
    };
    println!(
        "{} {} ({} arguments, {} templates)",
        style("Checked").bold(),
        style(name).cyan(),
        result.argument_count,
        result.template_count
    );

    print_findings(&result);

    let errors = result.errors().len();
    if errors > 0 {
        println!(
            "\n{} {} error(s), {} warning(s)",
            style("✗").red().bold(),
            errors,
            result.warnings().len()
        );
        std::process::exit(1);
    }
    println!("\n{} Template repository is valid", style("✓").green().bold());
    Ok(())
}

fn print_findings(result: &CheckResult) {
    for (section, findings) in result.by_section() {
        println!("\n{}", style(section).bold());
        for finding in findings {
            let marker = match finding.severity {
                Severity::Error => style("✗").red(),
                Severity::Warning => style("⚠").yellow(),
            };
            println!("  {marker} {}", finding.message);
        }
    }
}
