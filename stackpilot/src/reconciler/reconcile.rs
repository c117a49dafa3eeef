//! Create-or-update and validate-only.

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Reconciler, TemplateBody};
use crate::core::{Change, DeploymentRequest, Outcome, StackState, StackStatus};
use crate::errors::{
    PreconditionError, Result, StackpilotError, TimeoutError, ValidationError,
};
use crate::observability::OperationTimer;
use crate::polling::WaitResult;
use crate::provider::{
    StackChange, StackDescription, StackProvider, TemplateSummary, TemplateValidation,
    UpdateSubmission,
};

impl<P: StackProvider + ?Sized> Reconciler<P> {
    /// Brings the stack in line with `request` and waits for a terminal status.
    ///
    /// Failed and timed-out transitions come back as a failure [`Outcome`];
    /// errors are reserved for problems found before or outside the
    /// transition (bad input, unusable credentials, provider faults).
    #[instrument(skip_all, fields(stack_name = %request.stack_name))]
    pub async fn reconcile(&self, request: &DeploymentRequest) -> Result<Outcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = OperationTimer::start("reconcile", &request.stack_name);

        let validated = request.validate()?;
        let template = TemplateBody::load(&request.template_path)?;
        let stack_name = request.stack_name.as_str();

        self.emit(
            "reconcile.started",
            json!({
                "stack_name": stack_name,
                "run_id": run_id,
                "environment": validated.environment().as_str(),
                "region": request.region,
                "template_digest": template.digest,
            }),
        )
        .await;

        self.check_identity().await?;
        self.validate_remote(&template).await?;

        let current = self.current_stack(stack_name).await?;
        self.ensure_not_cancelled(stack_name)?;

        let change = StackChange {
            stack_name: stack_name.to_string(),
            template_body: template.body.clone(),
            parameters: validated.parameters(),
            capabilities: self.capabilities.clone(),
            client_request_token: run_id.to_string(),
        };

        let outcome = match current {
            None => {
                info!(stack_name, "Stack absent; creating");
                self.emit(
                    "stack.create.requested",
                    json!({"stack_name": stack_name, "run_id": run_id}),
                )
                .await;
                self.provider.create_stack(&change).await?;
                self.settle(stack_name, run_id, Change::Created, started_at)
                    .await?
            }
            Some(existing) if existing.status.requires_delete() => {
                let remedy = if existing.status == StackStatus::UpdateRollbackFailed {
                    "continue the update rollback, or delete it with --delete and deploy again"
                } else {
                    "delete it with --delete and deploy again"
                };
                return Err(PreconditionError::new(format!(
                    "stack '{stack_name}' is in {} and cannot be updated; {remedy}",
                    existing.status
                ))
                .into());
            }
            Some(existing) => {
                info!(stack_name, status = %existing.status, "Stack exists; updating");
                self.emit(
                    "stack.update.requested",
                    json!({
                        "stack_name": stack_name,
                        "run_id": run_id,
                        "current_status": existing.status.as_str(),
                    }),
                )
                .await;
                match self.provider.update_stack(&change).await? {
                    UpdateSubmission::Started => {
                        self.settle(stack_name, run_id, Change::Updated, started_at)
                            .await?
                    }
                    UpdateSubmission::NoChanges => {
                        info!(stack_name, "No updates to perform");
                        self.emit(
                            "stack.update.unchanged",
                            json!({"stack_name": stack_name, "run_id": run_id}),
                        )
                        .await;
                        let outputs = self.collect_outputs(stack_name).await?;
                        Outcome::success(
                            stack_name,
                            run_id,
                            Change::Unchanged,
                            Some(existing.status),
                            started_at,
                        )
                        .with_outputs(outputs)
                    }
                }
            }
        };

        timer.finish(&outcome.status.to_string());
        Ok(outcome.with_template_digest(template.digest))
    }

    /// Runs request validation, the identity probe and remote template
    /// validation, then stops without mutating anything.
    #[instrument(skip_all, fields(stack_name = %request.stack_name))]
    pub async fn validate_only(&self, request: &DeploymentRequest) -> Result<TemplateSummary> {
        request.validate()?;
        let template = TemplateBody::load(&request.template_path)?;

        self.check_identity().await?;
        let summary = self.validate_remote(&template).await?;

        self.emit(
            "template.validated",
            json!({
                "stack_name": request.stack_name,
                "template_digest": template.digest,
                "parameters": summary.parameters,
                "capabilities": summary.capabilities,
            }),
        )
        .await;
        Ok(summary)
    }

    /// Gate: the provider must accept the template.
    async fn validate_remote(&self, template: &TemplateBody) -> Result<TemplateSummary> {
        match self.provider.validate_template(&template.body).await? {
            TemplateValidation::Valid(summary) => {
                for required in &summary.capabilities {
                    if !self.capabilities.contains(required) {
                        warn!(
                            capability = %required,
                            "Template requires a capability that is not acknowledged"
                        );
                    }
                }
                Ok(summary)
            }
            TemplateValidation::Invalid(message) => Err(ValidationError::new(
                "template",
                format!("provider rejected the template: {message}"),
            )
            .into()),
        }
    }

    /// Describes the stack, first waiting out any transition already running.
    async fn current_stack(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        let current = self.provider.describe_stack(stack_name).await?;
        match current {
            Some(desc) if StackState::observe(Some(&desc.status)) == StackState::InProgress => {
                self.await_running(stack_name, &desc.status).await
            }
            other => Ok(other),
        }
    }

    /// Waits for a transition started elsewhere to settle.
    ///
    /// Returns `None` when the stack is gone afterwards. Timing out or being
    /// cancelled here is an error since nothing was changed yet.
    pub(super) async fn await_running(
        &self,
        stack_name: &str,
        status: &StackStatus,
    ) -> Result<Option<StackDescription>> {
        warn!(
            stack_name,
            status = %status,
            "Another transition is running; waiting for it to settle"
        );
        self.emit(
            "stack.wait.existing",
            json!({"stack_name": stack_name, "status": status.as_str()}),
        )
        .await;

        match self.wait(stack_name).await? {
            WaitResult::Settled(desc) => Ok(Some(desc)),
            WaitResult::Vanished => Ok(None),
            WaitResult::TimedOut {
                waited,
                last_status,
            } => Err(TimeoutError {
                stack_name: stack_name.to_string(),
                waited,
                last_status,
            }
            .into()),
            WaitResult::Cancelled { reason, .. } => {
                Err(StackpilotError::cancelled(stack_name, reason))
            }
        }
    }
}
