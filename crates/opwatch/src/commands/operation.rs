//! `opwatch operation` commands

use std::sync::Arc;

use opwatch_core::{Monitor, NoopPresenter, OperationRef, Presenter, attach_url};
use serde_json::json;
use tracing::debug;

use crate::cli::{OperationCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_json;
use crate::presenter::{SpinnerPresenter, format_done};

pub async fn handle_operation_command(
    cmd: &OperationCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output: OutputFormat,
) -> CliResult<()> {
    match cmd {
        OperationCommands::Wait {
            location,
            app,
            label,
            quiet,
        } => {
            wait_operation(
                conn_mgr,
                profile,
                location,
                app,
                label.as_deref(),
                *quiet,
                output,
            )
            .await
        }
        OperationCommands::AttachUrl { location, app } => {
            print_attach_url(conn_mgr, profile, location, app, output).await
        }
    }
}

async fn wait_operation(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    location: &str,
    app: &str,
    label: Option<&str>,
    quiet: bool,
    output: OutputFormat,
) -> CliResult<()> {
    // Reject a bad location before building a client or sending a request
    let op_ref = OperationRef::parse(location, app)?;
    let client = Arc::new(conn_mgr.create_client(profile)?);

    // The spinner reports the outcome itself; quiet and JSON modes print below
    let spinner_enabled = !quiet && output == OutputFormat::Auto;
    let spinner;
    let presenter: &dyn Presenter = if spinner_enabled {
        spinner = SpinnerPresenter::new();
        &spinner
    } else {
        &NoopPresenter
    };

    let elapsed = Monitor::new(client)
        .watch(&op_ref, label, presenter)
        .await
        .into_result()?;
    debug!("Operation {} finished in {:?}", op_ref, elapsed);

    match output {
        OutputFormat::Json => print_json(&json!({
            "operation_id": op_ref.id(),
            "status": "done",
            "elapsed_seconds": elapsed.as_secs_f64(),
        }))?,
        OutputFormat::Auto if !spinner_enabled => println!("{}", format_done(elapsed)),
        OutputFormat::Auto => {}
    }
    Ok(())
}

async fn print_attach_url(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    location: &str,
    app: &str,
    output: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile)?;
    let url = attach_url(&client, location, app).await?;

    match output {
        OutputFormat::Json => print_json(&json!({ "attach_url": url }))?,
        OutputFormat::Auto => println!("{}", url),
    }
    Ok(())
}
