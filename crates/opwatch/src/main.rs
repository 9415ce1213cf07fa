use anyhow::{Context, Result};
use clap::Parser;
use opwatch_core::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;
mod presenter;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::CliError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (
            Config::load().context("Failed to load configuration")?,
            None,
        )
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "opwatch=warn,opwatch_core=warn",
            1 => "opwatch=info,opwatch_core=info",
            2 => "opwatch=debug,opwatch_core=debug",
            _ => "opwatch=trace,opwatch_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), CliError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            match cli.output {
                cli::OutputFormat::Json => output::print_json(&serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                }))?,
                cli::OutputFormat::Auto => println!("opwatch {}", env!("CARGO_PKG_VERSION")),
            }
            Ok(())
        }
        Commands::Operation(operation_cmd) => {
            commands::operation::handle_operation_command(
                operation_cmd,
                conn_mgr,
                cli.profile.as_deref(),
                cli.output,
            )
            .await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Format command for human-readable logging
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Operation(cmd) => {
            use cli::OperationCommands::*;
            match cmd {
                Wait { location, app, .. } => format!("operation wait {} --app {}", location, app),
                AttachUrl { location, app } => {
                    format!("operation attach-url {} --app {}", location, app)
                }
            }
        }
    }
}
