use std::path::Path;

use console::style;
use miette::Result;

use strata_core::manifest::generate_service_manifest;

pub fn run(dir: String) -> Result<()> {
    let path = generate_service_manifest(Path::new(&dir))?;

    println!(
        "{} Wrote {}",
        style("✓").green().bold(),
        style(path.display()).cyan()
    );
    println!("  Add template repositories under 'repositories', then run `strata render`.");

    Ok(())
}
