//! Mode dispatch.

use serde::Serialize;
use tracing::warn;

use super::{Cli, Mode};
use crate::config::Settings;
use crate::core::Outcome;
use crate::errors::Result;
use crate::provider::{StackProvider, TemplateSummary};
use crate::reconciler::{Reconciler, StackReport};
use crate::render::{render_config, RenderReport};

/// What an invocation produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunReport {
    /// Create or update finished; the environment file may have been rendered.
    Deploy {
        /// Reconciliation outcome.
        outcome: Outcome,
        /// Rendering result, when a file was written.
        render: Option<RenderReport>,
    },
    /// Pre-mutation gates passed.
    ValidateOnly {
        /// Provider's view of the template.
        summary: TemplateSummary,
    },
    /// Delete finished.
    Delete {
        /// Teardown outcome.
        outcome: Outcome,
    },
    /// Current stack status.
    Status {
        /// Status report.
        report: StackReport,
    },
}

impl RunReport {
    /// The transition outcome, for modes that have one.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            Self::Deploy { outcome, .. } | Self::Delete { outcome } => Some(outcome),
            Self::ValidateOnly { .. } | Self::Status { .. } => None,
        }
    }

    /// Process exit status for this report.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.outcome()
            .and_then(|o| o.clone().into_result().err())
            .map_or(0, |e| e.exit_code())
    }
}

/// Runs the mode selected on the command line.
///
/// The environment file is rendered only after a successful deploy. A
/// missing environment template skips rendering with a warning.
pub async fn execute<P>(
    cli: &Cli,
    settings: &Settings,
    reconciler: &Reconciler<P>,
) -> Result<RunReport>
where
    P: StackProvider + ?Sized,
{
    match cli.mode() {
        Mode::Deploy => {
            let request = cli.request(settings);
            let outcome = reconciler.reconcile(&request).await?;
            let render = if outcome.is_success() {
                render_env(&outcome, settings)?
            } else {
                None
            };
            Ok(RunReport::Deploy { outcome, render })
        }
        Mode::ValidateOnly => {
            let request = cli.request(settings);
            let summary = reconciler.validate_only(&request).await?;
            Ok(RunReport::ValidateOnly { summary })
        }
        Mode::Delete => {
            let outcome = reconciler.teardown(&cli.stack_name).await?;
            Ok(RunReport::Delete { outcome })
        }
        Mode::Status => {
            let report = reconciler.status(&cli.stack_name).await?;
            Ok(RunReport::Status { report })
        }
    }
}

fn render_env(outcome: &Outcome, settings: &Settings) -> Result<Option<RenderReport>> {
    if !settings.env_template_path.is_file() {
        warn!(
            template = %settings.env_template_path.display(),
            "Environment template not found; skipping configuration render"
        );
        return Ok(None);
    }
    render_config(
        &outcome.outputs,
        &settings.env_template_path,
        &settings.env_output_path,
    )
    .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Change, StackStatus};
    use crate::testing::{
        fast_poll_config, sample_outputs, write_template, ScriptedProvider, SAMPLE_ENV_TEMPLATE,
    };
    use clap::Parser;
    use std::path::Path;
    use std::sync::Arc;

    fn cli(dir: &Path, extra: &[&str]) -> (Cli, Settings) {
        let template = write_template(dir).unwrap();
        let env_template = dir.join("env.template");
        let env_output = dir.join("out").join(".env");
        let mut args = vec![
            "stackpilot".to_string(),
            "--template".into(),
            template.display().to_string(),
            "--env-template".into(),
            env_template.display().to_string(),
            "--env-output".into(),
            env_output.display().to_string(),
        ];
        args.extend(extra.iter().map(|s| (*s).to_string()));
        let cli = Cli::try_parse_from(args).unwrap();
        let mut settings = cli.settings().unwrap();
        settings.poll = fast_poll_config();
        (cli, settings)
    }

    fn reconciler(provider: ScriptedProvider) -> Reconciler<ScriptedProvider> {
        Reconciler::new(Arc::new(provider)).with_poll_config(fast_poll_config())
    }

    #[tokio::test]
    async fn test_deploy_renders_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, settings) = cli(dir.path(), &[]);
        std::fs::write(&settings.env_template_path, SAMPLE_ENV_TEMPLATE).unwrap();

        let provider = ScriptedProvider::new().with_outputs(sample_outputs());
        let report = execute(&cli, &settings, &reconciler(provider)).await.unwrap();

        assert_eq!(report.exit_code(), 0);
        let RunReport::Deploy { outcome, render } = report else {
            panic!("expected deploy report");
        };
        assert_eq!(outcome.change, Change::Created);
        assert!(render.unwrap().missing.is_empty());

        let written = std::fs::read_to_string(&settings.env_output_path).unwrap();
        assert!(written.contains("SUPERVISOR_AGENT_ID=E4NLVBHEHI"));
    }

    #[tokio::test]
    async fn test_failed_deploy_does_not_render() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, settings) = cli(dir.path(), &[]);
        std::fs::write(&settings.env_template_path, SAMPLE_ENV_TEMPLATE).unwrap();
        let provider = ScriptedProvider::new()
            .with_create_script(vec![StackStatus::CreateInProgress, StackStatus::RollbackComplete]);

        let report = execute(&cli, &settings, &reconciler(provider)).await.unwrap();

        assert_eq!(report.exit_code(), 4);
        assert!(matches!(report, RunReport::Deploy { render: None, .. }));
        assert!(!settings.env_output_path.exists());
    }

    #[tokio::test]
    async fn test_missing_env_template_skips_render() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, settings) = cli(dir.path(), &[]);

        let report = execute(&cli, &settings, &reconciler(ScriptedProvider::new()))
            .await
            .unwrap();

        assert_eq!(report.exit_code(), 0);
        assert!(matches!(report, RunReport::Deploy { render: None, .. }));
    }

    #[tokio::test]
    async fn test_validate_only_and_status_modes() {
        let dir = tempfile::tempdir().unwrap();

        let (cli_validate, settings) = cli(dir.path(), &["--validate-only"]);
        let report = execute(&cli_validate, &settings, &reconciler(ScriptedProvider::new()))
            .await
            .unwrap();
        assert!(matches!(report, RunReport::ValidateOnly { .. }));
        assert_eq!(report.exit_code(), 0);

        let (cli_status, settings) = cli(dir.path(), &["--status"]);
        let report = execute(&cli_status, &settings, &reconciler(ScriptedProvider::new()))
            .await
            .unwrap();
        assert!(matches!(report, RunReport::Status { .. }));
    }

    #[tokio::test]
    async fn test_delete_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, settings) = cli(dir.path(), &["--delete"]);
        let provider = ScriptedProvider::new().with_existing(StackStatus::CreateComplete);

        let report = execute(&cli, &settings, &reconciler(provider)).await.unwrap();
        let outcome = report.outcome().unwrap();
        assert_eq!(outcome.change, Change::Deleted);
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_invalid_environment_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, settings) = cli(dir.path(), &["--environment", "qa"]);
        let err = execute(&cli, &settings, &reconciler(ScriptedProvider::new()))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
