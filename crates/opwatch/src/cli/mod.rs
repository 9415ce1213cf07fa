//! CLI structure and command definitions

use clap::{Parser, Subcommand};

/// Wait on long-running platform operations
#[derive(Parser, Debug)]
#[command(name = "opwatch")]
#[command(version, about = "Wait on long-running platform operations")]
#[command(long_about = "
Wait on long-running platform operations

API calls that scale, restart or start a one-off container answer with the URL
of an operation. opwatch follows that operation until it is done or fails.

EXAMPLES:
    # Wait for a scale operation
    opwatch operation wait https://api.example.com/v1/apps/my-app/operations/op_123 --app my-app

    # Machine-readable result
    opwatch operation wait <url> --app my-app -o json

    # Get the attach URL of a one-off container
    opwatch operation attach-url <url> --app my-app

For more help on a specific command, run:
    opwatch <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "OPWATCH_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "OPWATCH_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Auto,
    /// JSON output
    Json,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow platform operations
    #[command(subcommand, visible_alias = "op")]
    Operation(OperationCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

/// Operation commands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Wait until an operation is done or has failed
    #[command(after_help = "EXAMPLES:
    opwatch operation wait https://api.example.com/v1/apps/my-app/operations/op_123 --app my-app
    opwatch operation wait <url> --app my-app --label one-off-1234
")]
    Wait {
        /// Operation URL (the Location header of the call that started it)
        location: String,

        /// App owning the operation
        #[arg(long, short, env = "OPWATCH_APP")]
        app: String,

        /// Container label shown while a one-off container starts
        #[arg(long)]
        label: Option<String>,

        /// Do not show a progress spinner
        #[arg(long)]
        quiet: bool,
    },

    /// Print the attach URL of a one-off container operation
    AttachUrl {
        /// Operation URL
        location: String,

        /// App owning the operation
        #[arg(long, short, env = "OPWATCH_APP")]
        app: String,
    },
}
