//! # stackpilot
//!
//! Deploys the marketing agents stack, waits for it to settle and writes the
//! application's `.env` file from the stack outputs.
//!
//! - `stackpilot` creates or updates the stack
//! - `stackpilot --validate-only` checks credentials and the template
//! - `stackpilot --status` shows the stack status and outputs
//! - `stackpilot --delete` deletes the stack

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

use stackpilot::cancellation::CancellationToken;
use stackpilot::cli::{execute, print_error, print_report, Cli};
use stackpilot::errors::StackpilotError;
use stackpilot::events::LoggingEventSink;
use stackpilot::observability::init_logging;
use stackpilot::provider::CloudFormationProvider;
use stackpilot::reconciler::Reconciler;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level, cli.log_format) {
        print_error(&err);
        return exit_code(err.exit_code());
    }

    match run(cli).await {
        Ok(code) => exit_code(code),
        Err(err) => match err.downcast_ref::<StackpilotError>() {
            Some(known) => {
                print_error(known);
                exit_code(known.exit_code())
            }
            None => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let settings = cli.settings()?;

    let provider = CloudFormationProvider::from_region(&cli.region).await;
    info!(region = provider.region(), mode = ?cli.mode(), "Starting");

    let cancel = Arc::new(CancellationToken::new());
    spawn_interrupt_handler(Arc::clone(&cancel));

    let reconciler = Reconciler::new(Arc::new(provider))
        .with_event_sink(Arc::new(LoggingEventSink::info()))
        .with_poll_config(settings.poll.clone())
        .with_capabilities(settings.capabilities.clone())
        .with_cancellation(cancel);

    let report = execute(&cli, &settings, &reconciler).await?;
    print_report(&report);

    if let Some(outcome) = report.outcome() {
        let json = serde_json::to_string(outcome).context("serializing outcome")?;
        info!(outcome = %json, "Run finished");
    }
    Ok(report.exit_code())
}

fn spawn_interrupt_handler(cancel: Arc<CancellationToken>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping the wait, the remote transition keeps running");
            cancel.cancel("interrupted by operator");
        }
    });
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
