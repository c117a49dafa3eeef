//! Human-readable reporting on stdout/stderr.

use colored::Colorize;

use super::RunReport;
use crate::core::{Change, Failure, Outcome, OutputSet};
use crate::errors::StackpilotError;

/// Prints a report for the operator.
pub fn print_report(report: &RunReport) {
    match report {
        RunReport::Deploy { outcome, render } => {
            print_outcome(outcome);
            match render {
                Some(render) => {
                    println!(
                        "{} {}",
                        "Configuration written to".green(),
                        render.destination.display()
                    );
                    for key in &render.missing {
                        println!("  {} {key} (left empty)", "missing:".yellow());
                    }
                }
                None if outcome.is_success() => {
                    println!("{}", "Configuration not rendered".yellow());
                }
                None => {}
            }
        }
        RunReport::Delete { outcome } => print_outcome(outcome),
        RunReport::ValidateOnly { summary } => {
            println!("{}", "Template is valid".green().bold());
            if let Some(description) = &summary.description {
                println!("  description: {description}");
            }
            println!("  parameters: {}", summary.parameters.join(", "));
            if !summary.capabilities.is_empty() {
                println!("  capabilities: {}", summary.capabilities.join(", "));
            }
        }
        RunReport::Status { report } => {
            let status = report
                .status
                .as_ref()
                .map_or_else(|| "DOES_NOT_EXIST".to_string(), ToString::to_string);
            println!("{} {} ({})", report.stack_name.bold(), status.cyan(), report.state);
            if let Some(reason) = &report.status_reason {
                println!("  reason: {reason}");
            }
            print_outputs(&report.outputs);
        }
    }
}

fn print_outcome(outcome: &Outcome) {
    let state = outcome
        .terminal_state
        .as_ref()
        .map_or_else(|| "absent".to_string(), ToString::to_string);

    if outcome.is_success() {
        let headline = match outcome.change {
            Change::Created => "Stack created",
            Change::Updated => "Stack updated",
            Change::Unchanged => "Stack already up to date",
            Change::Deleted => "Stack deleted",
            Change::AlreadyAbsent => "Stack does not exist; nothing to delete",
        };
        println!(
            "{} {} [{state}] in {}s",
            headline.green().bold(),
            outcome.stack_name.bold(),
            outcome.duration().as_secs()
        );
    } else {
        let detail = match &outcome.failure {
            Some(Failure::TerminalState { reason }) => {
                reason.clone().unwrap_or_else(|| "no reason reported".into())
            }
            Some(Failure::TimedOut { waited_ms }) => {
                format!("timed out after {}s; stack left as is", waited_ms / 1_000)
            }
            Some(Failure::Cancelled { reason }) => {
                format!("cancelled ({reason}); the remote transition keeps running")
            }
            None => String::new(),
        };
        eprintln!(
            "{} {} {} [{state}]: {detail}",
            "Stack".red().bold(),
            outcome.stack_name.bold(),
            outcome.change.operation().red()
        );
    }

    print_outputs(&outcome.outputs);
}

fn print_outputs(outputs: &OutputSet) {
    if outputs.is_empty() {
        return;
    }
    println!("{}", "Outputs:".bold());
    for (key, value) in outputs.iter() {
        println!("  {key}: {value}");
    }
}

/// Prints an error with its fix hint, when there is one.
pub fn print_error(err: &StackpilotError) {
    eprintln!("{} {err}", "error:".red().bold());
    if let StackpilotError::Validation(v) = err {
        if let Some(hint) = &v.fix_hint {
            eprintln!("  {} {hint}", "hint:".yellow());
        }
    }
}
