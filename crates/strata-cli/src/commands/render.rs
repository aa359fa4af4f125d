use std::path::Path;

use console::style;
use miette::Result;

use strata_core::config::load_user_config;
use strata_core::fetch::{ensure_git_repository, Fetcher};
use strata_core::manifest::load_service_manifest;
use strata_core::render::{RunReport, WriteAction};
use strata_core::{render_service, RenderOptions};

pub fn run(dir: String, no_git_init: bool, json: bool) -> Result<()> {
    let service_dir = Path::new(&dir);
    let manifest = load_service_manifest(service_dir)?;
    let config = load_user_config()?;

    if !no_git_init && ensure_git_repository(service_dir)? && !json {
        println!(
            "{} Initialised git repository in {}",
            style("✓").green().bold(),
            style(service_dir.display()).cyan()
        );
    }

    if !json {
        println!(
            "{} Rendering {} from {} repositor{}",
            style("...").cyan().bold(),
            style(&manifest.name).cyan(),
            manifest.repositories.len(),
            if manifest.repositories.len() == 1 { "y" } else { "ies" }
        );
    }

    let fetcher = Fetcher::with_overrides(config.overrides);
    let options = RenderOptions::new(service_dir).with_formatters(config.formatters);
    let report = render_service(&manifest, &fetcher, &options)?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| miette::miette!("failed to serialize report: {e}"))?;
        println!("{out}");
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    for file in &report.files {
        let marker = match file.action {
            WriteAction::Created => style("+").green(),
            WriteAction::Updated => style("↻").cyan(),
            WriteAction::Skipping => style("=").dim(),
        };
        println!("  {marker} {:<8} {}", file.action, file.path.display());
    }

    println!("\n{} Render complete: {}", style("✓").green().bold(), report);
}
