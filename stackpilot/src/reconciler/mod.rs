//! The stack reconciler.
//!
//! [`Reconciler`] drives one named stack toward the desired state:
//! - `reconcile` creates or updates it and waits for a terminal status
//! - `teardown` deletes it and waits for it to disappear
//! - `validate_only` runs every pre-mutation gate and stops
//! - `status` reports what is there without changing anything
//!
//! Invocations run one remote call at a time. Two invocations against the
//! same stack must be serialized by the caller.

mod reconcile;
mod report;
mod teardown;
mod template;

pub use report::StackReport;
pub use template::{TemplateBody, MAX_TEMPLATE_BODY_BYTES};

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::core::{Change, Failure, Outcome, OutputKey, OutputSet, StackStatus};
use crate::errors::{PreconditionError, Result, StackpilotError};
use crate::events::{EventSink, NoOpEventSink};
use crate::polling::{wait_for_terminal, PollConfig, WaitResult};
use crate::provider::{StackProvider, CAPABILITY_NAMED_IAM};

/// Drives a stack through create, update and delete transitions.
pub struct Reconciler<P: StackProvider + ?Sized> {
    provider: Arc<P>,
    events: Arc<dyn EventSink>,
    poll: PollConfig,
    cancel: Arc<CancellationToken>,
    capabilities: Vec<String>,
}

impl<P: StackProvider + ?Sized> Reconciler<P> {
    /// Creates a reconciler with default polling and no event sink.
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            events: Arc::new(NoOpEventSink),
            poll: PollConfig::default(),
            cancel: Arc::new(CancellationToken::new()),
            capabilities: vec![CAPABILITY_NAMED_IAM.to_string()],
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the poll configuration.
    #[must_use]
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Shares a cancellation token with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Arc<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sets the capabilities acknowledged on create and update.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// The token that stops this reconciler's waits.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.cancel)
    }

    /// The poll configuration in use.
    #[must_use]
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Gate: the credentials must be usable before anything else is tried.
    async fn check_identity(&self) -> Result<()> {
        match self.provider.identity().await {
            Ok(identity) => {
                debug!(account = %identity.account, arn = %identity.arn, "Credentials usable");
                Ok(())
            }
            Err(err) => Err(PreconditionError::new(format!(
                "no usable provider credentials: {err}"
            ))
            .into()),
        }
    }

    fn ensure_not_cancelled(&self, stack_name: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            let reason = self.cancel.reason().unwrap_or_else(|| "cancelled".to_string());
            return Err(StackpilotError::cancelled(stack_name, reason));
        }
        Ok(())
    }

    async fn emit(&self, event_type: &str, data: serde_json::Value) {
        self.events.emit(event_type, Some(data)).await;
    }

    async fn wait(&self, stack_name: &str) -> Result<WaitResult> {
        Ok(wait_for_terminal(
            self.provider.as_ref(),
            stack_name,
            &self.poll,
            &self.cancel,
            self.events.as_ref(),
        )
        .await?)
    }

    /// Fetches outputs and reports recognized keys the stack did not publish.
    async fn collect_outputs(&self, stack_name: &str) -> Result<OutputSet> {
        let outputs = self.provider.get_outputs(stack_name).await?;
        let missing = outputs.missing();
        if !missing.is_empty() {
            for key in &missing {
                warn!(stack_name, key = key.as_str(), "Stack output missing");
            }
            self.emit(
                "outputs.missing",
                json!({
                    "stack_name": stack_name,
                    "keys": missing.iter().map(OutputKey::as_str).collect::<Vec<_>>(),
                }),
            )
            .await;
        }
        Ok(outputs)
    }

    /// Turns the end of a post-mutation wait into an outcome.
    async fn settle(
        &self,
        stack_name: &str,
        run_id: Uuid,
        change: Change,
        started_at: DateTime<Utc>,
    ) -> Result<Outcome> {
        let operation = change.operation();
        let outcome = match self.wait(stack_name).await? {
            WaitResult::Settled(desc) if reached_goal(change, &desc.status) => {
                let outputs = if change == Change::Deleted {
                    OutputSet::new()
                } else {
                    self.collect_outputs(stack_name).await?
                };
                Outcome::success(stack_name, run_id, change, Some(desc.status), started_at)
                    .with_outputs(outputs)
            }
            WaitResult::Settled(desc) => Outcome::failure(
                stack_name,
                run_id,
                change,
                Some(desc.status),
                Failure::TerminalState {
                    reason: desc.status_reason,
                },
                started_at,
            ),
            WaitResult::Vanished if change == Change::Deleted => {
                Outcome::success(stack_name, run_id, change, None, started_at)
            }
            WaitResult::Vanished => Outcome::failure(
                stack_name,
                run_id,
                change,
                Some(StackStatus::DeleteComplete),
                Failure::TerminalState {
                    reason: Some("stack disappeared before the transition completed".into()),
                },
                started_at,
            ),
            WaitResult::TimedOut {
                waited,
                last_status,
            } => Outcome::failure(
                stack_name,
                run_id,
                change,
                last_status,
                Failure::TimedOut {
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                },
                started_at,
            ),
            WaitResult::Cancelled {
                reason,
                last_status,
            } => Outcome::failure(
                stack_name,
                run_id,
                change,
                last_status,
                Failure::Cancelled { reason },
                started_at,
            ),
        };

        let event = if outcome.is_success() {
            format!("stack.{operation}.completed")
        } else {
            format!("stack.{operation}.failed")
        };
        self.emit(
            &event,
            json!({
                "stack_name": stack_name,
                "run_id": run_id,
                "terminal_state": outcome.terminal_state.as_ref().map(StackStatus::as_str),
                "failure": outcome.failure,
            }),
        )
        .await;

        Ok(outcome)
    }
}

impl<P: StackProvider + ?Sized> std::fmt::Debug for Reconciler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("poll", &self.poll)
            .field("capabilities", &self.capabilities)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

fn reached_goal(change: Change, status: &StackStatus) -> bool {
    match change {
        Change::Deleted | Change::AlreadyAbsent => *status == StackStatus::DeleteComplete,
        Change::Created | Change::Updated | Change::Unchanged => status.is_complete(),
    }
}
