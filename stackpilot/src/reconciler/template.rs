//! Loading the declarative template from disk.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::errors::ValidationError;

/// Largest template body the provider accepts inline.
pub const MAX_TEMPLATE_BODY_BYTES: usize = 51_200;

/// A template read from disk, ready to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBody {
    /// Raw template text.
    pub body: String,
    /// Hex SHA-256 of `body`.
    pub digest: String,
}

impl TemplateBody {
    /// Wraps an in-memory body.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        let body = body.into();
        let digest = hex::encode(Sha256::digest(body.as_bytes()));
        Self { body, digest }
    }

    /// Reads and checks a template file.
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::new(
                "template",
                format!("cannot read template {}: {e}", path.display()),
            )
            .with_fix_hint("Pass --template with the path to the CloudFormation template")
        })?;

        if body.trim().is_empty() {
            return Err(ValidationError::new(
                "template",
                format!("template {} is empty", path.display()),
            ));
        }

        if body.len() > MAX_TEMPLATE_BODY_BYTES {
            return Err(ValidationError::new(
                "template",
                format!(
                    "template {} is {} bytes; inline bodies are limited to {MAX_TEMPLATE_BODY_BYTES}",
                    path.display(),
                    body.len()
                ),
            )
            .with_fix_hint("Trim the template or split it into nested stacks"));
        }

        Ok(Self::new(body))
    }
}
