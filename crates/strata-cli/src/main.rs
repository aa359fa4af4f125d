mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    if cli.global.no_color {
        console::set_colors_enabled(false);
    }
    logging::init_logging(&cli.global)?;

    match cli.command.unwrap_or(Commands::Render {
        dir: ".".into(),
        no_git_init: false,
        json: false,
    }) {
        Commands::Render {
            dir,
            no_git_init,
            json,
        } => commands::render::run(dir, no_git_init, json),
        Commands::Generate { dir } => commands::generate::run(dir),
        Commands::TemplateList { template_dir } => commands::template_list::run(template_dir),
        Commands::Check { path } => commands::check::run(path),
    }
}
