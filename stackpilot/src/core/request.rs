//! Deployment requests and their validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::ValidationError;

static STACK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][-A-Za-z0-9]{0,127}$").expect("valid regex"));

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{0,31}$").expect("valid regex"));

static BUCKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("valid regex")
});

/// Checks a stack name against the provider's naming rules.
pub fn validate_stack_name(name: &str) -> Result<(), ValidationError> {
    if STACK_NAME.is_match(name) {
        return Ok(());
    }
    Err(
        ValidationError::new("stack_name", format!("'{name}' is not a valid stack name"))
            .with_fix_hint(
                "Start with a letter; use only letters, digits and hyphens (max 128 chars)",
            ),
    )
}

/// Deployment environment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development.
    Dev,
    /// Staging.
    Staging,
    /// Production.
    Prod,
}

impl Environment {
    /// All accepted environments, in display order.
    pub const ALL: [Self; 3] = [Self::Dev, Self::Staging, Self::Prod];

    /// Returns the tag as passed to the template.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "staging" => Ok(Self::Staging),
            "prod" => Ok(Self::Prod),
            other => Err(ValidationError::new(
                "environment",
                format!("'{other}' is not a supported environment"),
            )
            .with_fix_hint("Use one of: dev, staging, prod")),
        }
    }
}

/// A single template parameter passed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackParameter {
    /// Parameter key as declared in the template.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

impl StackParameter {
    /// Creates a new parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything one invocation needs to know about the desired stack.
///
/// The environment is kept as operator text so that a bad value surfaces as
/// a [`ValidationError`] from the reconciler rather than a parse failure at
/// some earlier layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Stack name.
    pub stack_name: String,
    /// Provider region.
    pub region: String,
    /// Environment tag (`dev`, `staging`, `prod`).
    pub environment: String,
    /// Project name prefix used by the template for resource names.
    pub project_name: String,
    /// Custom name for the assets bucket.
    pub bucket_name: Option<String>,
    /// Bucket holding knowledge-base source documents.
    pub kb_source_bucket: Option<String>,
    /// Whether the template should provision log groups.
    pub enable_logging: bool,
    /// Path to the declarative template.
    pub template_path: PathBuf,
}

impl DeploymentRequest {
    /// Creates a request with the default project name and logging enabled.
    #[must_use]
    pub fn new(
        stack_name: impl Into<String>,
        region: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            region: region.into(),
            environment: environment.into(),
            project_name: "marketing-agents".to_string(),
            bucket_name: None,
            kb_source_bucket: None,
            enable_logging: true,
            template_path: PathBuf::from("cloudformation-template.yaml"),
        }
    }

    /// Sets the project name.
    #[must_use]
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    /// Sets a custom bucket name.
    #[must_use]
    pub fn with_bucket_name(mut self, name: impl Into<String>) -> Self {
        self.bucket_name = Some(name.into());
        self
    }

    /// Sets the knowledge-base source bucket.
    #[must_use]
    pub fn with_kb_source_bucket(mut self, name: impl Into<String>) -> Self {
        self.kb_source_bucket = Some(name.into());
        self
    }

    /// Enables or disables logging resources.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Sets the template path.
    #[must_use]
    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = path.into();
        self
    }

    /// Validates the request without contacting any remote system.
    pub fn validate(&self) -> Result<ValidatedRequest<'_>, ValidationError> {
        let environment: Environment = self.environment.parse()?;

        validate_stack_name(&self.stack_name)?;

        if self.region.trim().is_empty() {
            return Err(ValidationError::new("region", "region must not be empty"));
        }

        if !PROJECT_NAME.is_match(&self.project_name) {
            return Err(ValidationError::new(
                "project_name",
                format!("'{}' is not a valid project name", self.project_name),
            )
            .with_fix_hint("Use lowercase letters, digits and hyphens (max 32 chars)"));
        }

        for (field, bucket) in [
            ("bucket_name", &self.bucket_name),
            ("kb_source_bucket", &self.kb_source_bucket),
        ] {
            if let Some(name) = bucket {
                if !BUCKET_NAME.is_match(name) || name.contains("..") {
                    return Err(ValidationError::new(
                        field,
                        format!("'{name}' is not a valid bucket name"),
                    )
                    .with_fix_hint(
                        "Use 3-63 lowercase letters, digits, dots or hyphens; start and end with a letter or digit",
                    ));
                }
            }
        }

        Ok(ValidatedRequest {
            request: self,
            environment,
        })
    }
}

/// A request that passed local validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRequest<'a> {
    request: &'a DeploymentRequest,
    environment: Environment,
}

impl ValidatedRequest<'_> {
    /// The parsed environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Template parameters derived from the request.
    #[must_use]
    pub fn parameters(&self) -> Vec<StackParameter> {
        let r = self.request;
        vec![
            StackParameter::new("Environment", self.environment.as_str()),
            StackParameter::new("ProjectName", &r.project_name),
            StackParameter::new("S3BucketName", r.bucket_name.clone().unwrap_or_default()),
            StackParameter::new(
                "KnowledgeBaseSourceBucket",
                r.kb_source_bucket.clone().unwrap_or_default(),
            ),
            StackParameter::new("EnableLogging", r.enable_logging.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DeploymentRequest {
        DeploymentRequest::new("marketing-agents-dev", "us-east-1", "dev")
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
    }

    #[test]
    fn test_environment_rejects_other_values() {
        for bad in ["", "Dev", "production", "test", " dev"] {
            let err = bad.parse::<Environment>().unwrap_err();
            assert_eq!(err.field, "environment");
            assert!(err.fix_hint.is_some());
        }
    }

    #[test]
    fn test_valid_request_parameters() {
        let req = request().with_kb_source_bucket("kb-docs-bucket").with_logging(false);
        let validated = req.validate().unwrap();
        assert_eq!(validated.environment(), Environment::Dev);

        let params = validated.parameters();
        assert_eq!(
            params,
            vec![
                StackParameter::new("Environment", "dev"),
                StackParameter::new("ProjectName", "marketing-agents"),
                StackParameter::new("S3BucketName", ""),
                StackParameter::new("KnowledgeBaseSourceBucket", "kb-docs-bucket"),
                StackParameter::new("EnableLogging", "false"),
            ]
        );
    }

    #[test]
    fn test_invalid_stack_name() {
        let mut req = request();
        req.stack_name = "1-starts-with-digit".into();
        assert_eq!(req.validate().unwrap_err().field, "stack_name");

        req.stack_name = "has_underscore".into();
        assert_eq!(req.validate().unwrap_err().field, "stack_name");
    }

    #[test]
    fn test_invalid_bucket_name() {
        let req = request().with_bucket_name("Upper-Case");
        assert_eq!(req.validate().unwrap_err().field, "bucket_name");

        let req = request().with_kb_source_bucket("a..b");
        assert_eq!(req.validate().unwrap_err().field, "kb_source_bucket");

        let req = request().with_bucket_name("ab");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_environment_checked_first() {
        let mut req = request();
        req.environment = "qa".into();
        req.stack_name = "also bad".into();
        assert_eq!(req.validate().unwrap_err().field, "environment");
    }

    #[test]
    fn test_validate_stack_name() {
        assert!(validate_stack_name("marketing-agents-prod").is_ok());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_empty_region() {
        let mut req = request();
        req.region = "  ".into();
        assert_eq!(req.validate().unwrap_err().field, "region");
    }
}
