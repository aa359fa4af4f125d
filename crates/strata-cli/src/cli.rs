use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Scaffold and regenerate services from layered template repositories",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Defaults to `render` in the current directory
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the service described by service.yaml
    Render {
        /// Service directory containing service.yaml (default: current directory)
        #[arg(short, long, default_value = ".")]
        dir: String,

        /// Do not initialise a git repository in the service directory
        #[arg(long)]
        no_git_init: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a starter service.yaml
    Generate {
        /// Service directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        dir: String,
    },

    /// Regenerate files.yaml.tpl from the templates in a directory
    TemplateList {
        /// Template directory to scan
        template_dir: String,
    },

    /// Validate a template repository
    Check {
        /// Path to the template repository (default: current directory)
        #[arg(default_value = ".")]
        path: String,
    },
}
