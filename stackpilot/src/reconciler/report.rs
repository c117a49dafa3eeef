//! Read-only stack status.

use serde::Serialize;
use tracing::instrument;

use super::Reconciler;
use crate::core::{validate_stack_name, OutputSet, StackState, StackStatus};
use crate::errors::Result;
use crate::provider::StackProvider;

/// What the provider currently reports for a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackReport {
    /// Stack name.
    pub stack_name: String,
    /// Lifecycle state.
    pub state: StackState,
    /// Raw provider status, when the stack exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StackStatus>,
    /// Provider supplied reason for the status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// Published outputs; empty while a transition is running.
    pub outputs: OutputSet,
}

impl<P: StackProvider + ?Sized> Reconciler<P> {
    /// Describes the stack and its outputs without changing anything.
    #[instrument(skip(self))]
    pub async fn status(&self, stack_name: &str) -> Result<StackReport> {
        validate_stack_name(stack_name)?;

        let Some(desc) = self.provider.describe_stack(stack_name).await? else {
            return Ok(StackReport {
                stack_name: stack_name.to_string(),
                state: StackState::Absent,
                status: None,
                status_reason: None,
                outputs: OutputSet::new(),
            });
        };

        let outputs = if desc.status.is_in_progress() {
            OutputSet::new()
        } else {
            self.provider.get_outputs(stack_name).await?
        };

        let state = if desc.status.is_in_progress() {
            StackState::InProgress
        } else {
            desc.status.settled_state()
        };

        Ok(StackReport {
            stack_name: stack_name.to_string(),
            state,
            status: Some(desc.status),
            status_reason: desc.status_reason,
            outputs,
        })
    }
}
