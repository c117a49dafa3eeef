//! Test fixtures for reconciler testing.

use std::path::{Path, PathBuf};

use crate::core::{DeploymentRequest, OutputKey, OutputSet};
use crate::polling::{JitterStrategy, PollConfig};

/// A minimal template body. The reconciler never parses it.
pub const SAMPLE_TEMPLATE: &str = r#"AWSTemplateFormatVersion: '2010-09-09'
Description: Marketing agents stack
Parameters:
  Environment:
    Type: String
    AllowedValues: [dev, staging, prod]
  ProjectName:
    Type: String
    Default: marketing-agents
  S3BucketName:
    Type: String
    Default: ''
  KnowledgeBaseSourceBucket:
    Type: String
    Default: ''
  EnableLogging:
    Type: String
    Default: 'true'
Resources:
  AssetsBucket:
    Type: AWS::S3::Bucket
Outputs:
  S3BucketName:
    Value: !Ref AssetsBucket
"#;

/// The shipped environment template.
pub const SAMPLE_ENV_TEMPLATE: &str = include_str!("../../templates/env.template");

/// File name used by [`write_template`].
pub const TEMPLATE_FILE_NAME: &str = "cloudformation-template.yaml";

/// Writes [`SAMPLE_TEMPLATE`] into `dir` and returns its path.
pub fn write_template(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(TEMPLATE_FILE_NAME);
    std::fs::write(&path, SAMPLE_TEMPLATE)?;
    Ok(path)
}

/// A valid dev request pointing at `template_path`.
#[must_use]
pub fn sample_request(template_path: impl Into<PathBuf>) -> DeploymentRequest {
    DeploymentRequest::new("marketing-agents-dev", "us-east-1", "dev")
        .with_template_path(template_path)
}

/// A poll configuration that settles in milliseconds.
#[must_use]
pub fn fast_poll_config() -> PollConfig {
    PollConfig::new()
        .with_initial_interval_ms(1)
        .with_max_interval_ms(5)
        .with_jitter(JitterStrategy::None)
        .with_timeout_secs(5)
        .with_max_consecutive_errors(3)
}

/// Every recognized output with a plausible value.
#[must_use]
pub fn sample_outputs() -> OutputSet {
    OutputSet::new()
        .with(OutputKey::S3BucketName, "marketing-agents-dev-assets-123")
        .with(OutputKey::SupervisorAgentId, "E4NLVBHEHI")
        .with(OutputKey::ContentAgentId, "C0NT3NTAG1")
        .with(OutputKey::VisualAgentId, "V1SUALAG3N")
        .with(OutputKey::KnowledgeBaseId, "KB12345678")
        .with(OutputKey::LogGroupName, "/aws/bedrock/marketing-agents-dev")
        .with(
            OutputKey::BedrockAgentRoleArn,
            "arn:aws:iam::123456789012:role/marketing-agents-dev-agent-role",
        )
}
