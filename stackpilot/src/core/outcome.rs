//! Reconciliation outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::{OutputSet, StackState, StackStatus};
use crate::errors::{RemoteTransitionError, StackpilotError, TimeoutError};

/// Whether an invocation reached its goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The stack reached the desired state.
    Success,
    /// The stack did not reach the desired state.
    Failure,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// The transition an invocation issued (or decided not to issue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// A create transition was issued.
    Created,
    /// An update transition was issued.
    Updated,
    /// The provider reported there was nothing to update.
    Unchanged,
    /// A delete transition was issued.
    Deleted,
    /// Nothing to delete.
    AlreadyAbsent,
}

impl Change {
    /// The provider operation behind this change.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Created => "create",
            Self::Updated | Self::Unchanged => "update",
            Self::Deleted | Self::AlreadyAbsent => "delete",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Deleted => write!(f, "deleted"),
            Self::AlreadyAbsent => write!(f, "already absent"),
        }
    }
}

/// Why an invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The transition reached a failed or rollback terminal state.
    TerminalState {
        /// Provider supplied reason, if any.
        reason: Option<String>,
    },
    /// The wait exceeded its bound.
    TimedOut {
        /// How long the poll loop waited, in milliseconds.
        waited_ms: u64,
    },
    /// The operator cancelled the wait.
    Cancelled {
        /// Cancellation reason.
        reason: String,
    },
}

/// Structured result of `reconcile` or `teardown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Stack the invocation acted on.
    pub stack_name: String,
    /// Identifier of this invocation; also the provider client request token.
    pub run_id: Uuid,
    /// Success or failure.
    pub status: OutcomeStatus,
    /// The transition issued.
    pub change: Change,
    /// Last status observed, if the stack existed at the end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_state: Option<StackStatus>,
    /// Outputs, populated only on a complete create/update.
    #[serde(default, skip_serializing_if = "OutputSet::is_empty")]
    pub outputs: OutputSet,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// SHA-256 of the template body that was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_digest: Option<String>,
    /// When the invocation started.
    pub started_at: DateTime<Utc>,
    /// When the invocation finished.
    pub finished_at: DateTime<Utc>,
}

impl Outcome {
    /// Creates a successful outcome.
    #[must_use]
    pub fn success(
        stack_name: impl Into<String>,
        run_id: Uuid,
        change: Change,
        terminal_state: Option<StackStatus>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            run_id,
            status: OutcomeStatus::Success,
            change,
            terminal_state,
            outputs: OutputSet::new(),
            failure: None,
            template_digest: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failure(
        stack_name: impl Into<String>,
        run_id: Uuid,
        change: Change,
        terminal_state: Option<StackStatus>,
        failure: Failure,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            run_id,
            status: OutcomeStatus::Failure,
            change,
            terminal_state,
            outputs: OutputSet::new(),
            failure: Some(failure),
            template_digest: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Attaches outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: OutputSet) -> Self {
        self.outputs = outputs;
        self
    }

    /// Attaches the template digest.
    #[must_use]
    pub fn with_template_digest(mut self, digest: impl Into<String>) -> Self {
        self.template_digest = Some(digest.into());
        self
    }

    /// Returns true if the invocation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Returns true if the update was a no-op.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.change == Change::Unchanged
    }

    /// Lifecycle state the stack ended in.
    #[must_use]
    pub fn state(&self) -> StackState {
        match (&self.terminal_state, self.status) {
            (None | Some(StackStatus::DeleteComplete), _) => StackState::Absent,
            (Some(_), OutcomeStatus::Success) => StackState::Complete,
            (Some(s), OutcomeStatus::Failure) => s.settled_state(),
        }
    }

    /// Wall-clock duration of the invocation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Converts a failed outcome into the matching error.
    pub fn into_result(mut self) -> Result<Self, StackpilotError> {
        let Some(failure) = self.failure.take() else {
            return Ok(self);
        };
        match failure {
            Failure::TerminalState { reason } => {
                let terminal_state = self
                    .terminal_state
                    .unwrap_or(StackStatus::DeleteComplete);
                Err(RemoteTransitionError {
                    stack_name: self.stack_name,
                    operation: self.change.operation().to_string(),
                    terminal_state,
                    status_reason: reason,
                }
                .into())
            }
            Failure::TimedOut { waited_ms } => Err(TimeoutError {
                stack_name: self.stack_name,
                waited: Duration::from_millis(waited_ms),
                last_status: self.terminal_state,
            }
            .into()),
            Failure::Cancelled { reason } => {
                Err(StackpilotError::cancelled(self.stack_name, reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OutputKey;

    #[test]
    fn test_success_outcome() {
        let outcome = Outcome::success(
            "marketing-dev",
            Uuid::new_v4(),
            Change::Created,
            Some(StackStatus::CreateComplete),
            Utc::now(),
        )
        .with_outputs(OutputSet::new().with(OutputKey::S3BucketName, "bucket"));

        assert!(outcome.is_success());
        assert!(!outcome.is_unchanged());
        assert_eq!(outcome.state(), StackState::Complete);
        assert!(outcome.clone().into_result().is_ok());
    }

    #[test]
    fn test_terminal_failure_into_result() {
        let outcome = Outcome::failure(
            "marketing-dev",
            Uuid::new_v4(),
            Change::Created,
            Some(StackStatus::RollbackComplete),
            Failure::TerminalState { reason: None },
            Utc::now(),
        );
        assert_eq!(outcome.state(), StackState::Failed);

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("ROLLBACK_COMPLETE"));
        assert!(err.to_string().contains("create"));
    }

    #[test]
    fn test_timeout_into_result() {
        let outcome = Outcome::failure(
            "s",
            Uuid::new_v4(),
            Change::Updated,
            Some(StackStatus::UpdateInProgress),
            Failure::TimedOut { waited_ms: 5_000 },
            Utc::now(),
        );
        assert_eq!(outcome.state(), StackState::InProgress);
        assert_eq!(outcome.into_result().unwrap_err().exit_code(), 5);
    }

    #[test]
    fn test_already_absent_state() {
        let outcome = Outcome::success("s", Uuid::new_v4(), Change::AlreadyAbsent, None, Utc::now());
        assert_eq!(outcome.state(), StackState::Absent);
        assert_eq!(outcome.change.operation(), "delete");
    }

    #[test]
    fn test_outcome_serialize() {
        let outcome = Outcome::failure(
            "s",
            Uuid::nil(),
            Change::Updated,
            Some(StackStatus::UpdateRollbackComplete),
            Failure::TerminalState {
                reason: Some("bad".into()),
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["change"], "updated");
        assert_eq!(json["terminal_state"], "UPDATE_ROLLBACK_COMPLETE");
        assert_eq!(json["failure"]["kind"], "terminal_state");
        assert!(json.get("outputs").is_none());
    }
}
