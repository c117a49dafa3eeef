//! Stack deletion.

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::Reconciler;
use crate::core::{validate_stack_name, Change, Outcome, StackStatus};
use crate::errors::Result;
use crate::observability::OperationTimer;
use crate::provider::StackProvider;

impl<P: StackProvider + ?Sized> Reconciler<P> {
    /// Deletes the stack and waits until it is gone.
    ///
    /// A transition already running is waited out before the delete is
    /// issued. An absent stack is a success with [`Change::AlreadyAbsent`]
    /// and no delete call. A delete that ends in `DELETE_FAILED` is reported as a
    /// failure outcome and not retried.
    #[instrument(skip(self))]
    pub async fn teardown(&self, stack_name: &str) -> Result<Outcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = OperationTimer::start("teardown", stack_name);

        validate_stack_name(stack_name)?;
        self.check_identity().await?;

        let mut current = self.provider.describe_stack(stack_name).await?;
        if let Some(status) = current
            .as_ref()
            .map(|d| d.status.clone())
            .filter(|s| s.is_in_progress() && *s != StackStatus::DeleteInProgress)
        {
            current = self.await_running(stack_name, &status).await?;
        }

        let Some(current) = current.filter(|d| d.status != StackStatus::DeleteComplete) else {
            info!(stack_name, "Stack absent; nothing to delete");
            self.emit(
                "stack.delete.skipped",
                json!({"stack_name": stack_name, "run_id": run_id}),
            )
            .await;
            timer.finish("already_absent");
            return Ok(Outcome::success(
                stack_name,
                run_id,
                Change::AlreadyAbsent,
                None,
                started_at,
            ));
        };

        self.ensure_not_cancelled(stack_name)?;

        if current.status == StackStatus::DeleteInProgress {
            info!(stack_name, "Delete already running; waiting");
        } else {
            info!(stack_name, status = %current.status, "Deleting stack");
            self.emit(
                "stack.delete.requested",
                json!({
                    "stack_name": stack_name,
                    "run_id": run_id,
                    "current_status": current.status.as_str(),
                }),
            )
            .await;
            self.provider
                .delete_stack(stack_name, &run_id.to_string())
                .await?;
        }

        let outcome = self
            .settle(stack_name, run_id, Change::Deleted, started_at)
            .await?;
        timer.finish(&outcome.status.to_string());
        Ok(outcome)
    }
}
