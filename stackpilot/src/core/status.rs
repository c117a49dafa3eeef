//! Stack status and state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw stack status as reported by the provider.
///
/// Statuses the crate does not know about are kept verbatim in
/// [`StackStatus::Unknown`] and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StackStatus {
    /// `CREATE_IN_PROGRESS`
    CreateInProgress,
    /// `CREATE_FAILED`
    CreateFailed,
    /// `CREATE_COMPLETE`
    CreateComplete,
    /// `ROLLBACK_IN_PROGRESS`
    RollbackInProgress,
    /// `ROLLBACK_FAILED`
    RollbackFailed,
    /// `ROLLBACK_COMPLETE`
    RollbackComplete,
    /// `DELETE_IN_PROGRESS`
    DeleteInProgress,
    /// `DELETE_FAILED`
    DeleteFailed,
    /// `DELETE_COMPLETE`
    DeleteComplete,
    /// `UPDATE_IN_PROGRESS`
    UpdateInProgress,
    /// `UPDATE_COMPLETE_CLEANUP_IN_PROGRESS`
    UpdateCompleteCleanupInProgress,
    /// `UPDATE_COMPLETE`
    UpdateComplete,
    /// `UPDATE_FAILED`
    UpdateFailed,
    /// `UPDATE_ROLLBACK_IN_PROGRESS`
    UpdateRollbackInProgress,
    /// `UPDATE_ROLLBACK_FAILED`
    UpdateRollbackFailed,
    /// `UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS`
    UpdateRollbackCompleteCleanupInProgress,
    /// `UPDATE_ROLLBACK_COMPLETE`
    UpdateRollbackComplete,
    /// `REVIEW_IN_PROGRESS`
    ReviewInProgress,
    /// `IMPORT_IN_PROGRESS`
    ImportInProgress,
    /// `IMPORT_COMPLETE`
    ImportComplete,
    /// `IMPORT_ROLLBACK_IN_PROGRESS`
    ImportRollbackInProgress,
    /// `IMPORT_ROLLBACK_FAILED`
    ImportRollbackFailed,
    /// `IMPORT_ROLLBACK_COMPLETE`
    ImportRollbackComplete,
    /// Any status string this crate does not recognize.
    Unknown(String),
}

impl StackStatus {
    /// Parses a provider status string. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_FAILED" => Self::CreateFailed,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => Self::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => Self::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => Self::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                Self::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => Self::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => Self::ReviewInProgress,
            "IMPORT_IN_PROGRESS" => Self::ImportInProgress,
            "IMPORT_COMPLETE" => Self::ImportComplete,
            "IMPORT_ROLLBACK_IN_PROGRESS" => Self::ImportRollbackInProgress,
            "IMPORT_ROLLBACK_FAILED" => Self::ImportRollbackFailed,
            "IMPORT_ROLLBACK_COMPLETE" => Self::ImportRollbackComplete,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the provider spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            Self::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            Self::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            Self::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::ImportInProgress => "IMPORT_IN_PROGRESS",
            Self::ImportComplete => "IMPORT_COMPLETE",
            Self::ImportRollbackInProgress => "IMPORT_ROLLBACK_IN_PROGRESS",
            Self::ImportRollbackFailed => "IMPORT_ROLLBACK_FAILED",
            Self::ImportRollbackComplete => "IMPORT_ROLLBACK_COMPLETE",
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns true while the provider is still working on a transition.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.as_str().ends_with("_IN_PROGRESS")
    }

    /// Returns true for statuses that mean the last transition succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::CreateComplete | Self::UpdateComplete | Self::ImportComplete
        )
    }

    /// Returns true for failed or rolled back terminal statuses.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::CreateFailed
                | Self::UpdateFailed
                | Self::RollbackComplete
                | Self::RollbackFailed
                | Self::UpdateRollbackComplete
                | Self::UpdateRollbackFailed
                | Self::DeleteFailed
                | Self::ImportRollbackComplete
                | Self::ImportRollbackFailed
        )
    }

    /// Returns true when no further automatic transition will happen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_failed() || matches!(self, Self::DeleteComplete)
    }

    /// Returns true when the stack cannot take an update as it stands.
    ///
    /// A first create that rolled back leaves the stack in this condition.
    /// `UPDATE_ROLLBACK_FAILED` also qualifies until the rollback is continued
    /// or the stack is deleted.
    #[must_use]
    pub fn requires_delete(&self) -> bool {
        matches!(
            self,
            Self::RollbackComplete
                | Self::RollbackFailed
                | Self::DeleteFailed
                | Self::UpdateRollbackFailed
        )
    }

    /// Classifies a status observed at the end of a wait.
    #[must_use]
    pub fn settled_state(&self) -> StackState {
        if matches!(self, Self::DeleteComplete) {
            StackState::Absent
        } else if self.is_complete() {
            StackState::Complete
        } else if self.is_failed() {
            StackState::Failed
        } else {
            StackState::InProgress
        }
    }
}

impl From<String> for StackStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<StackStatus> for String {
    fn from(status: StackStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a stack as seen by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackState {
    /// No stack with this name exists.
    Absent,
    /// The stack exists and is idle.
    Existing,
    /// A transition is running.
    InProgress,
    /// The last transition succeeded.
    Complete,
    /// The last transition failed or rolled back.
    Failed,
}

impl StackState {
    /// Classifies the result of a describe call made before any transition.
    #[must_use]
    pub fn observe(status: Option<&StackStatus>) -> Self {
        match status {
            None | Some(StackStatus::DeleteComplete) => Self::Absent,
            Some(s) if s.is_in_progress() => Self::InProgress,
            Some(_) => Self::Existing,
        }
    }

    /// Returns true if the state ends one invocation.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Absent)
    }
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Existing => write!(f, "existing"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_known_statuses() {
        for raw in [
            "CREATE_COMPLETE",
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
            "IMPORT_ROLLBACK_FAILED",
            "REVIEW_IN_PROGRESS",
        ] {
            assert_eq!(StackStatus::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn test_unknown_status_is_kept_verbatim() {
        let status = StackStatus::parse("QUANTUM_FLUX");
        assert_eq!(status, StackStatus::Unknown("QUANTUM_FLUX".to_string()));
        assert!(!status.is_terminal());
        assert_eq!(status.settled_state(), StackState::InProgress);
    }

    #[test]
    fn test_terminal_states() {
        assert!(StackStatus::CreateComplete.is_terminal());
        assert!(StackStatus::UpdateComplete.is_terminal());
        assert!(StackStatus::CreateFailed.is_terminal());
        assert!(StackStatus::UpdateFailed.is_terminal());
        assert!(StackStatus::RollbackComplete.is_terminal());
        assert!(StackStatus::DeleteComplete.is_terminal());
        assert!(!StackStatus::CreateInProgress.is_terminal());
        assert!(!StackStatus::UpdateCompleteCleanupInProgress.is_terminal());
    }

    #[test]
    fn test_settled_state() {
        assert_eq!(StackStatus::CreateComplete.settled_state(), StackState::Complete);
        assert_eq!(StackStatus::UpdateRollbackComplete.settled_state(), StackState::Failed);
        assert_eq!(StackStatus::DeleteComplete.settled_state(), StackState::Absent);
        assert_eq!(StackStatus::UpdateInProgress.settled_state(), StackState::InProgress);
    }

    #[test]
    fn test_observe() {
        assert_eq!(StackState::observe(None), StackState::Absent);
        assert_eq!(
            StackState::observe(Some(&StackStatus::DeleteComplete)),
            StackState::Absent
        );
        assert_eq!(
            StackState::observe(Some(&StackStatus::UpdateRollbackInProgress)),
            StackState::InProgress
        );
        assert_eq!(
            StackState::observe(Some(&StackStatus::UpdateRollbackComplete)),
            StackState::Existing
        );
    }

    #[test]
    fn test_requires_delete() {
        assert!(StackStatus::RollbackComplete.requires_delete());
        assert!(StackStatus::UpdateRollbackFailed.requires_delete());
        assert!(!StackStatus::UpdateRollbackComplete.requires_delete());
        assert!(!StackStatus::CreateComplete.requires_delete());
    }

    #[test]
    fn test_status_serialize() {
        let json = serde_json::to_string(&StackStatus::UpdateComplete).unwrap();
        assert_eq!(json, r#""UPDATE_COMPLETE""#);

        let back: StackStatus = serde_json::from_str(r#""ROLLBACK_COMPLETE""#).unwrap();
        assert_eq!(back, StackStatus::RollbackComplete);
    }
}
