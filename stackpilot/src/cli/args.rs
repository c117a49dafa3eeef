//! Command line surface.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::config::Settings;
use crate::core::DeploymentRequest;
use crate::errors::Result;
use crate::observability::LogFormat;
use crate::polling::PollConfig;

/// Deploy, validate, inspect or delete the marketing agents stack.
#[derive(Debug, Parser)]
#[command(name = "stackpilot")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["validate_only", "delete", "status"])))]
pub struct Cli {
    /// Stack name
    #[arg(long, env = "STACKPILOT_STACK_NAME", default_value = "marketing-agents-dev")]
    pub stack_name: String,

    /// Provider region
    #[arg(long, env = "STACKPILOT_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Environment (dev, staging, prod)
    #[arg(long, env = "STACKPILOT_ENVIRONMENT", default_value = "dev")]
    pub environment: String,

    /// Project name prefix for resource names
    #[arg(long, env = "STACKPILOT_PROJECT_NAME", default_value = "marketing-agents")]
    pub project_name: String,

    /// Custom name for the assets bucket
    #[arg(long, env = "STACKPILOT_BUCKET_NAME")]
    pub bucket_name: Option<String>,

    /// Bucket holding knowledge-base source documents
    #[arg(long, env = "STACKPILOT_KB_SOURCE_BUCKET")]
    pub kb_source_bucket: Option<String>,

    /// Provision log groups
    #[arg(
        long,
        env = "STACKPILOT_ENABLE_LOGGING",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_name = "BOOL"
    )]
    pub enable_logging: bool,

    /// Validate the template and exit without changing anything
    #[arg(long)]
    pub validate_only: bool,

    /// Delete the stack
    #[arg(long)]
    pub delete: bool,

    /// Show the stack status and outputs
    #[arg(long)]
    pub status: bool,

    /// CloudFormation template
    #[arg(long, env = "STACKPILOT_TEMPLATE", value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Placeholder-bearing environment template
    #[arg(long, env = "STACKPILOT_ENV_TEMPLATE", value_name = "FILE")]
    pub env_template: Option<PathBuf>,

    /// Where the rendered environment file is written
    #[arg(long, env = "STACKPILOT_ENV_OUTPUT", value_name = "FILE")]
    pub env_output: Option<PathBuf>,

    /// Upper bound on waiting for a transition, in seconds
    #[arg(long, env = "STACKPILOT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// First poll interval, in seconds
    #[arg(
        long,
        env = "STACKPILOT_POLL_INTERVAL_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: Option<u64>,

    /// JSON settings file
    #[arg(short, long, env = "STACKPILOT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STACKPILOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "STACKPILOT_LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,
}

/// What one invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create or update, then render the environment file.
    Deploy,
    /// Run the pre-mutation gates only.
    ValidateOnly,
    /// Delete the stack.
    Delete,
    /// Report the current status.
    Status,
}

impl Cli {
    /// The selected mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.validate_only {
            Mode::ValidateOnly
        } else if self.delete {
            Mode::Delete
        } else if self.status {
            Mode::Status
        } else {
            Mode::Deploy
        }
    }

    /// Loads the settings file and applies flag overrides on top.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;

        if let Some(path) = &self.template {
            settings.template_path.clone_from(path);
        }
        if let Some(path) = &self.env_template {
            settings.env_template_path.clone_from(path);
        }
        if let Some(path) = &self.env_output {
            settings.env_output_path.clone_from(path);
        }
        settings.poll = self.poll_config(settings.poll);

        Ok(settings)
    }

    fn poll_config(&self, mut poll: PollConfig) -> PollConfig {
        if let Some(secs) = self.timeout_secs {
            poll.timeout_secs = secs;
        }
        if let Some(secs) = self.poll_interval_secs {
            poll.initial_interval_ms = secs.saturating_mul(1_000);
            poll.max_interval_ms = poll.max_interval_ms.max(poll.initial_interval_ms);
        }
        poll
    }

    /// Builds the deployment request.
    #[must_use]
    pub fn request(&self, settings: &Settings) -> DeploymentRequest {
        let mut request =
            DeploymentRequest::new(&self.stack_name, &self.region, &self.environment)
                .with_project_name(&self.project_name)
                .with_logging(self.enable_logging)
                .with_template_path(&settings.template_path);
        if let Some(bucket) = &self.bucket_name {
            request = request.with_bucket_name(bucket);
        }
        if let Some(bucket) = &self.kb_source_bucket {
            request = request.with_kb_source_bucket(bucket);
        }
        request
    }
}
