//! Scripted in-memory provider for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::core::{OutputSet, StackParameter, StackStatus};
use crate::errors::ProviderError;
use crate::provider::{
    CallerIdentity, StackChange, StackDescription, StackProvider, TemplateSummary,
    TemplateValidation, UpdateSubmission, CAPABILITY_NAMED_IAM,
};

/// A call recorded by [`ScriptedProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    /// `identity`
    Identity,
    /// `validate_template`
    ValidateTemplate,
    /// `describe_stack(name)`
    Describe(String),
    /// `create_stack(name)`
    Create(String),
    /// `update_stack(name)`
    Update(String),
    /// `delete_stack(name)`
    Delete(String),
    /// `get_outputs(name)`
    GetOutputs(String),
}

impl ProviderCall {
    /// Returns true for calls that start a remote transition.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Update(_) | Self::Delete(_))
    }
}

#[derive(Debug)]
struct Script {
    exists: bool,
    statuses: VecDeque<StackStatus>,
    status_reason: Option<String>,
    create_script: Vec<StackStatus>,
    update_script: Vec<StackStatus>,
    delete_script: Vec<StackStatus>,
    outputs: OutputSet,
    applied: Option<(String, Vec<StackParameter>)>,
    force_no_changes: bool,
    identity_error: Option<String>,
    template_rejection: Option<String>,
    describe_failures: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            exists: false,
            statuses: VecDeque::new(),
            status_reason: None,
            create_script: vec![StackStatus::CreateInProgress, StackStatus::CreateComplete],
            update_script: vec![StackStatus::UpdateInProgress, StackStatus::UpdateComplete],
            delete_script: vec![StackStatus::DeleteInProgress, StackStatus::DeleteComplete],
            outputs: OutputSet::new(),
            applied: None,
            force_no_changes: false,
            identity_error: None,
            template_rejection: None,
            describe_failures: 0,
        }
    }
}

/// A provider that plays back scripted status sequences and records calls.
///
/// After a transition starts, each `describe_stack` pops the next scripted
/// status; the last one sticks. Updates whose template body and parameters
/// match the last applied ones report [`UpdateSubmission::NoChanges`], which
/// is how the real control plane behaves.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl ScriptedProvider {
    /// Creates a provider with no stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an idle stack in the given status.
    #[must_use]
    pub fn with_existing(self, status: StackStatus) -> Self {
        self.with_existing_script(vec![status])
    }

    /// Starts with a stack whose describes return these statuses in order.
    #[must_use]
    pub fn with_existing_script(self, statuses: Vec<StackStatus>) -> Self {
        {
            let mut script = self.script.lock();
            script.exists = true;
            script.statuses = statuses.into();
        }
        self
    }

    /// Statuses reported after a create.
    #[must_use]
    pub fn with_create_script(self, statuses: Vec<StackStatus>) -> Self {
        self.script.lock().create_script = statuses;
        self
    }

    /// Statuses reported after an update.
    #[must_use]
    pub fn with_update_script(self, statuses: Vec<StackStatus>) -> Self {
        self.script.lock().update_script = statuses;
        self
    }

    /// Statuses reported after a delete.
    #[must_use]
    pub fn with_delete_script(self, statuses: Vec<StackStatus>) -> Self {
        self.script.lock().delete_script = statuses;
        self
    }

    /// Outputs returned once the stack exists.
    #[must_use]
    pub fn with_outputs(self, outputs: OutputSet) -> Self {
        self.script.lock().outputs = outputs;
        self
    }

    /// Reason attached to failed statuses.
    #[must_use]
    pub fn with_status_reason(self, reason: impl Into<String>) -> Self {
        self.script.lock().status_reason = Some(reason.into());
        self
    }

    /// Every update reports that nothing changed.
    #[must_use]
    pub fn with_no_changes(self) -> Self {
        self.script.lock().force_no_changes = true;
        self
    }

    /// The identity probe fails with this message.
    #[must_use]
    pub fn failing_identity(self, message: impl Into<String>) -> Self {
        self.script.lock().identity_error = Some(message.into());
        self
    }

    /// Remote validation rejects the template with this message.
    #[must_use]
    pub fn rejecting_template(self, message: impl Into<String>) -> Self {
        self.script.lock().template_rejection = Some(message.into());
        self
    }

    /// The next `count` describes fail with a throttling error.
    #[must_use]
    pub fn with_describe_failures(self, count: usize) -> Self {
        self.script.lock().describe_failures = count;
        self
    }

    /// Returns all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    /// Returns the recorded mutations.
    #[must_use]
    pub fn mutations(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of remote calls of any kind.
    #[must_use]
    pub fn remote_call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true if the stack currently exists.
    #[must_use]
    pub fn stack_exists(&self) -> bool {
        self.script.lock().exists
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl StackProvider for ScriptedProvider {
    async fn identity(&self) -> Result<CallerIdentity, ProviderError> {
        self.record(ProviderCall::Identity);
        match &self.script.lock().identity_error {
            Some(message) => Err(ProviderError::new("get_caller_identity", message.clone())
                .with_code("ExpiredToken")),
            None => Ok(CallerIdentity {
                account: "123456789012".to_string(),
                arn: "arn:aws:iam::123456789012:user/deployer".to_string(),
            }),
        }
    }

    async fn validate_template(&self, _body: &str) -> Result<TemplateValidation, ProviderError> {
        self.record(ProviderCall::ValidateTemplate);
        match &self.script.lock().template_rejection {
            Some(message) => Ok(TemplateValidation::Invalid(message.clone())),
            None => Ok(TemplateValidation::Valid(TemplateSummary {
                description: Some("Marketing agents stack".to_string()),
                parameters: vec![
                    "Environment".to_string(),
                    "ProjectName".to_string(),
                    "S3BucketName".to_string(),
                    "KnowledgeBaseSourceBucket".to_string(),
                    "EnableLogging".to_string(),
                ],
                capabilities: vec![CAPABILITY_NAMED_IAM.to_string()],
            })),
        }
    }

    async fn describe_stack(
        &self,
        stack_name: &str,
    ) -> Result<Option<StackDescription>, ProviderError> {
        self.record(ProviderCall::Describe(stack_name.to_string()));
        let mut script = self.script.lock();

        if script.describe_failures > 0 {
            script.describe_failures -= 1;
            return Err(ProviderError::new("describe_stacks", "Rate exceeded").with_code("Throttling"));
        }
        if !script.exists {
            return Ok(None);
        }

        let status = if script.statuses.len() > 1 {
            script.statuses.pop_front()
        } else {
            script.statuses.front().cloned()
        };
        let Some(status) = status else {
            return Ok(None);
        };

        if status == StackStatus::DeleteComplete {
            script.exists = false;
            script.statuses.clear();
            script.applied = None;
            return Ok(None);
        }

        let status_reason = if status.is_failed() {
            script.status_reason.clone()
        } else {
            None
        };

        Ok(Some(StackDescription {
            stack_name: stack_name.to_string(),
            stack_id: Some(format!(
                "arn:aws:cloudformation:us-east-1:123456789012:stack/{stack_name}/0000"
            )),
            status,
            status_reason,
        }))
    }

    async fn create_stack(&self, change: &StackChange) -> Result<(), ProviderError> {
        self.record(ProviderCall::Create(change.stack_name.clone()));
        let mut script = self.script.lock();
        if script.exists {
            return Err(ProviderError::new(
                "create_stack",
                format!("Stack [{}] already exists", change.stack_name),
            )
            .with_code("AlreadyExistsException"));
        }
        script.exists = true;
        script.statuses = script.create_script.clone().into();
        script.applied = Some((change.template_body.clone(), change.parameters.clone()));
        Ok(())
    }

    async fn update_stack(&self, change: &StackChange) -> Result<UpdateSubmission, ProviderError> {
        self.record(ProviderCall::Update(change.stack_name.clone()));
        let mut script = self.script.lock();
        if !script.exists {
            return Err(ProviderError::new(
                "update_stack",
                format!("Stack with id {} does not exist", change.stack_name),
            )
            .with_code("ValidationError"));
        }

        let desired = (change.template_body.clone(), change.parameters.clone());
        if script.force_no_changes || script.applied.as_ref() == Some(&desired) {
            return Ok(UpdateSubmission::NoChanges);
        }

        script.statuses = script.update_script.clone().into();
        script.applied = Some(desired);
        Ok(UpdateSubmission::Started)
    }

    async fn delete_stack(
        &self,
        stack_name: &str,
        _client_request_token: &str,
    ) -> Result<(), ProviderError> {
        self.record(ProviderCall::Delete(stack_name.to_string()));
        let mut script = self.script.lock();
        if script.exists {
            script.statuses = script.delete_script.clone().into();
        }
        Ok(())
    }

    async fn get_outputs(&self, stack_name: &str) -> Result<OutputSet, ProviderError> {
        self.record(ProviderCall::GetOutputs(stack_name.to_string()));
        let script = self.script.lock();
        if !script.exists {
            return Err(ProviderError::new(
                "describe_stacks",
                format!("Stack with id {stack_name} does not exist"),
            )
            .with_code("ValidationError"));
        }
        Ok(script.outputs.clone())
    }
}
