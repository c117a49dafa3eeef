//! The remote infrastructure-control seam.
//!
//! The reconciler only ever talks to a [`StackProvider`]. Production code
//! uses [`CloudFormationProvider`]; tests use the scripted provider from
//! [`crate::testing`] or the automocked trait.

#[cfg(feature = "aws")]
mod aws;

#[cfg(feature = "aws")]
pub use aws::CloudFormationProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{OutputSet, StackParameter, StackStatus};
use crate::errors::ProviderError;

/// Capability the marketing template needs: it creates named IAM roles.
pub const CAPABILITY_NAMED_IAM: &str = "CAPABILITY_NAMED_IAM";

/// Principal behind the active credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Account id.
    pub account: String,
    /// Principal ARN.
    pub arn: String,
}

/// What remote validation learned about a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    /// Template description.
    pub description: Option<String>,
    /// Declared parameter keys.
    pub parameters: Vec<String>,
    /// Capabilities the template requires.
    pub capabilities: Vec<String>,
}

/// Result of remote template validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValidation {
    /// The provider accepted the template.
    Valid(TemplateSummary),
    /// The provider rejected the template.
    Invalid(String),
}

/// A stack as reported by describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    /// Stack name.
    pub stack_name: String,
    /// Provider stack id.
    pub stack_id: Option<String>,
    /// Current status.
    pub status: StackStatus,
    /// Provider supplied reason for the status.
    pub status_reason: Option<String>,
}

/// Everything needed to issue a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackChange {
    /// Stack name.
    pub stack_name: String,
    /// Template body, forwarded verbatim.
    pub template_body: String,
    /// Template parameters.
    pub parameters: Vec<StackParameter>,
    /// Acknowledged capabilities.
    pub capabilities: Vec<String>,
    /// Idempotency token for this invocation.
    pub client_request_token: String,
}

/// How the provider responded to an update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSubmission {
    /// An update transition started.
    Started,
    /// The provider reported there is nothing to update.
    NoChanges,
}

/// Operations of the remote control plane, keyed by stack name.
///
/// Implementations run in one region fixed at construction time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackProvider: Send + Sync {
    /// Lightweight probe proving the credentials are usable.
    async fn identity(&self) -> Result<CallerIdentity, ProviderError>;

    /// Validates a template body remotely.
    async fn validate_template(&self, body: &str) -> Result<TemplateValidation, ProviderError>;

    /// Describes a stack; `None` when it does not exist.
    async fn describe_stack(&self, stack_name: &str)
        -> Result<Option<StackDescription>, ProviderError>;

    /// Starts a create transition.
    async fn create_stack(&self, change: &StackChange) -> Result<(), ProviderError>;

    /// Starts an update transition.
    async fn update_stack(&self, change: &StackChange) -> Result<UpdateSubmission, ProviderError>;

    /// Starts a delete transition.
    async fn delete_stack(&self, stack_name: &str, client_request_token: &str)
        -> Result<(), ProviderError>;

    /// Fetches the stack's outputs.
    async fn get_outputs(&self, stack_name: &str) -> Result<OutputSet, ProviderError>;
}
