//! Error types for stackpilot.
//!
//! Every failure an operator can hit maps to one variant of
//! [`StackpilotError`], and every variant maps to a distinct process exit
//! status (see [`StackpilotError::exit_code`]).
//!
//! Missing stack outputs are not errors: the renderer reports them as
//! warnings and the run continues.

use std::time::Duration;
use thiserror::Error;

use crate::core::StackStatus;

/// Result alias used across the crate.
pub type Result<T, E = StackpilotError> = std::result::Result<T, E>;

/// The main error type for stackpilot operations.
#[derive(Debug, Error)]
pub enum StackpilotError {
    /// Bad operator input or a template the provider rejected.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No usable credentials, or the stack is in a state that forbids the operation.
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// A create/update/delete reached a failed or rollback terminal state.
    #[error("{0}")]
    RemoteTransition(#[from] RemoteTransitionError),

    /// Waiting for a terminal state exceeded the configured bound.
    #[error("{0}")]
    Timeout(#[from] TimeoutError),

    /// Polling was cancelled by the operator.
    #[error("Cancelled while waiting for stack '{stack_name}': {reason}")]
    Cancelled {
        /// Stack that was being waited on.
        stack_name: String,
        /// Cancellation reason.
        reason: String,
    },

    /// The provider call itself failed (network, throttling, unexpected response).
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Settings file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StackpilotError {
    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(stack_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            stack_name: stack_name.into(),
            reason: reason.into(),
        }
    }

    /// Process exit status reported to the operator.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Precondition(_) => 3,
            Self::RemoteTransition(_) => 4,
            Self::Timeout(_) => 5,
            Self::Provider(_) => 6,
            Self::Config(_) | Self::Io(_) => 7,
            Self::Cancelled { .. } => 130,
        }
    }

    /// Returns true when the error was raised before any remote mutation was attempted.
    #[must_use]
    pub const fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Precondition(_) | Self::Config(_)
        )
    }
}

/// Error raised when operator input or the template is invalid.
#[derive(Debug, Clone, Error)]
#[error("Validation failed for {field}: {message}")]
pub struct ValidationError {
    /// The offending field (`environment`, `stack_name`, `template`, ...).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
    /// Hint for fixing the input.
    pub fix_hint: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            fix_hint: None,
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Error raised when a fast-fail gate does not pass.
#[derive(Debug, Clone, Error)]
#[error("Precondition failed: {message}")]
pub struct PreconditionError {
    /// Description of the failed gate.
    pub message: String,
}

impl PreconditionError {
    /// Creates a new precondition error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error raised when a remote transition ends in a failed terminal state.
#[derive(Debug, Clone, Error)]
#[error("Stack '{stack_name}' {operation} ended in {terminal_state}{}", reason_suffix(.status_reason.as_deref()))]
pub struct RemoteTransitionError {
    /// The stack name.
    pub stack_name: String,
    /// The transition that was issued (`create`, `update`, `delete`).
    pub operation: String,
    /// The terminal state the provider converged to.
    pub terminal_state: StackStatus,
    /// Provider supplied reason, if any.
    pub status_reason: Option<String>,
}

fn reason_suffix(reason: Option<&str>) -> String {
    reason
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

/// Error raised when a wait exceeds its bound.
#[derive(Debug, Clone, Error)]
#[error(
    "Timed out after {}s waiting for stack '{stack_name}' (last status: {})",
    .waited.as_secs(),
    .last_status.as_ref().map_or_else(|| "unknown".to_string(), ToString::to_string)
)]
pub struct TimeoutError {
    /// The stack name.
    pub stack_name: String,
    /// How long the poll loop waited.
    pub waited: Duration,
    /// The last status observed before giving up.
    pub last_status: Option<StackStatus>,
}

/// Error raised by a provider call.
#[derive(Debug, Clone, Error)]
#[error("{operation} failed{}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
pub struct ProviderError {
    /// Provider operation that failed (`describe_stacks`, `create_stack`, ...).
    pub operation: String,
    /// Provider error code, when the provider returned one.
    pub code: Option<String>,
    /// Human readable message.
    pub message: String,
}

impl ProviderError {
    /// Creates a new provider error.
    #[must_use]
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Sets the provider error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            StackpilotError::from(ValidationError::new("environment", "bad")),
            StackpilotError::from(PreconditionError::new("no credentials")),
            StackpilotError::from(RemoteTransitionError {
                stack_name: "s".into(),
                operation: "create".into(),
                terminal_state: StackStatus::RollbackComplete,
                status_reason: None,
            }),
            StackpilotError::from(TimeoutError {
                stack_name: "s".into(),
                waited: Duration::from_secs(1),
                last_status: None,
            }),
            StackpilotError::from(ProviderError::new("describe_stacks", "boom")),
            StackpilotError::Io(std::io::Error::other("disk")),
            StackpilotError::cancelled("s", "interrupted"),
        ];

        let mut codes: Vec<i32> = errors.iter().map(StackpilotError::exit_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_remote_transition_message_names_state() {
        let err = RemoteTransitionError {
            stack_name: "marketing-dev".into(),
            operation: "update".into(),
            terminal_state: StackStatus::UpdateRollbackComplete,
            status_reason: Some("Resource creation cancelled".into()),
        };
        assert_eq!(
            err.to_string(),
            "Stack 'marketing-dev' update ended in UPDATE_ROLLBACK_COMPLETE (Resource creation cancelled)"
        );
    }

    #[test]
    fn test_timeout_message_without_status() {
        let err = TimeoutError {
            stack_name: "s".into(),
            waited: Duration::from_secs(90),
            last_status: None,
        };
        assert!(err.to_string().contains("90s"));
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_provider_error_with_code() {
        let err = ProviderError::new("create_stack", "throttled").with_code("Throttling");
        assert_eq!(err.to_string(), "create_stack failed [Throttling]: throttled");
    }

    #[test]
    fn test_pre_mutation_classification() {
        assert!(StackpilotError::from(ValidationError::new("x", "y")).is_pre_mutation());
        assert!(StackpilotError::from(PreconditionError::new("x")).is_pre_mutation());
        assert!(!StackpilotError::from(ProviderError::new("x", "y")).is_pre_mutation());
    }
}
