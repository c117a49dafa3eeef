//! CloudFormation-backed provider.

use async_trait::async_trait;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{Capability, Parameter};
use tracing::debug;

use super::{
    CallerIdentity, StackChange, StackDescription, StackProvider, TemplateSummary,
    TemplateValidation, UpdateSubmission,
};
use crate::core::{OutputSet, StackStatus};
use crate::errors::ProviderError;

const VALIDATION_ERROR_CODE: &str = "ValidationError";
const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";
const DOES_NOT_EXIST_SUFFIX: &str = "does not exist";

/// [`StackProvider`] on top of the AWS SDK.
#[derive(Debug, Clone)]
pub struct CloudFormationProvider {
    cfn: aws_sdk_cloudformation::Client,
    sts: aws_sdk_sts::Client,
    region: String,
}

impl CloudFormationProvider {
    /// Resolves credentials from the default chain for the given region.
    pub async fn from_region(region: impl Into<String>) -> Self {
        let region = region.into();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        Self {
            cfn: aws_sdk_cloudformation::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
            region,
        }
    }

    /// Region this provider talks to.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    fn parameters(change: &StackChange) -> Vec<Parameter> {
        change
            .parameters
            .iter()
            .map(|p| {
                Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .build()
            })
            .collect()
    }

    fn capabilities(change: &StackChange) -> Vec<Capability> {
        change
            .capabilities
            .iter()
            .map(|c| Capability::from(c.as_str()))
            .collect()
    }
}

fn provider_error<E>(operation: &str, err: &E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_string);
    let error = ProviderError::new(operation, message);
    match err.code() {
        Some(code) => error.with_code(code),
        None => error,
    }
}

fn is_validation_error<E: ProvideErrorMetadata>(err: &E) -> bool {
    err.code() == Some(VALIDATION_ERROR_CODE)
}

#[async_trait]
impl StackProvider for CloudFormationProvider {
    async fn identity(&self) -> Result<CallerIdentity, ProviderError> {
        let out = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| provider_error("get_caller_identity", &e))?;

        Ok(CallerIdentity {
            account: out.account().unwrap_or_default().to_string(),
            arn: out.arn().unwrap_or_default().to_string(),
        })
    }

    async fn validate_template(&self, body: &str) -> Result<TemplateValidation, ProviderError> {
        match self.cfn.validate_template().template_body(body).send().await {
            Ok(out) => Ok(TemplateValidation::Valid(TemplateSummary {
                description: out.description().map(str::to_string),
                parameters: out
                    .parameters()
                    .iter()
                    .filter_map(|p| p.parameter_key().map(str::to_string))
                    .collect(),
                capabilities: out
                    .capabilities()
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })),
            Err(err) if is_validation_error(&err) => Ok(TemplateValidation::Invalid(
                err.message().unwrap_or("template rejected").to_string(),
            )),
            Err(err) => Err(provider_error("validate_template", &err)),
        }
    }

    async fn describe_stack(
        &self,
        stack_name: &str,
    ) -> Result<Option<StackDescription>, ProviderError> {
        let out = match self.cfn.describe_stacks().stack_name(stack_name).send().await {
            Ok(out) => out,
            Err(err)
                if is_validation_error(&err)
                    && err
                        .message()
                        .is_some_and(|m| m.ends_with(DOES_NOT_EXIST_SUFFIX)) =>
            {
                debug!(stack_name, "Stack does not exist");
                return Ok(None);
            }
            Err(err) => return Err(provider_error("describe_stacks", &err)),
        };

        let Some(stack) = out.stacks().first() else {
            return Ok(None);
        };
        let Some(status) = stack.stack_status() else {
            return Err(ProviderError::new(
                "describe_stacks",
                format!("stack '{stack_name}' has no status"),
            ));
        };

        Ok(Some(StackDescription {
            stack_name: stack_name.to_string(),
            stack_id: stack.stack_id().map(str::to_string),
            status: StackStatus::parse(status.as_str()),
            status_reason: stack.stack_status_reason().map(str::to_string),
        }))
    }

    async fn create_stack(&self, change: &StackChange) -> Result<(), ProviderError> {
        self.cfn
            .create_stack()
            .stack_name(&change.stack_name)
            .template_body(&change.template_body)
            .set_parameters(Some(Self::parameters(change)))
            .set_capabilities(Some(Self::capabilities(change)))
            .client_request_token(&change.client_request_token)
            .send()
            .await
            .map_err(|e| provider_error("create_stack", &e))?;
        Ok(())
    }

    async fn update_stack(&self, change: &StackChange) -> Result<UpdateSubmission, ProviderError> {
        let result = self
            .cfn
            .update_stack()
            .stack_name(&change.stack_name)
            .template_body(&change.template_body)
            .set_parameters(Some(Self::parameters(change)))
            .set_capabilities(Some(Self::capabilities(change)))
            .client_request_token(&change.client_request_token)
            .send()
            .await;

        match result {
            Ok(_) => Ok(UpdateSubmission::Started),
            Err(err) if is_validation_error(&err) && err.message() == Some(NO_UPDATES_MESSAGE) => {
                Ok(UpdateSubmission::NoChanges)
            }
            Err(err) => Err(provider_error("update_stack", &err)),
        }
    }

    async fn delete_stack(
        &self,
        stack_name: &str,
        client_request_token: &str,
    ) -> Result<(), ProviderError> {
        self.cfn
            .delete_stack()
            .stack_name(stack_name)
            .client_request_token(client_request_token)
            .send()
            .await
            .map_err(|e| provider_error("delete_stack", &e))?;
        Ok(())
    }

    async fn get_outputs(&self, stack_name: &str) -> Result<OutputSet, ProviderError> {
        let out = self
            .cfn
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| provider_error("describe_stacks", &e))?;

        let stack = out.stacks().first().ok_or_else(|| {
            ProviderError::new("describe_stacks", format!("stack '{stack_name}' not found"))
        })?;

        Ok(stack
            .outputs()
            .iter()
            .filter_map(|o| Some((o.output_key()?, o.output_value().unwrap_or_default())))
            .collect())
    }
}
