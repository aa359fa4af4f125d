use std::path::Path;

use console::style;
use miette::Result;

use strata_core::manifest::generate_template_list;

pub fn run(template_dir: String) -> Result<()> {
    let dir = Path::new(&template_dir);
    if !dir.is_dir() {
        return Err(miette::miette!(
            "Template directory does not exist: {}",
            dir.display()
        ));
    }

    let path = generate_template_list(dir)?;

    println!(
        "{} Updated {}",
        style("✓").green().bold(),
        style(path.display()).cyan()
    );

    Ok(())
}
