//! Configuration artifact rendering.
//!
//! [`render`] is the pure core: it substitutes recognized placeholder tokens
//! with output values in a single left-to-right pass. [`render_config`]
//! wraps it with file IO.

mod placeholders;
#[cfg(test)]
mod render_tests;

pub use placeholders::{key_for, PLACEHOLDERS};

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::{OutputKey, OutputSet};
use crate::errors::Result;
use placeholders::PLACEHOLDER_PATTERN;

/// Result of rendering a template in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Rendered text.
    pub text: String,
    /// Keys whose placeholder was replaced by a value.
    pub substituted: Vec<OutputKey>,
    /// Keys whose placeholder was present but had no value.
    pub missing: Vec<OutputKey>,
}

impl Rendered {
    /// Returns true if every placeholder found had a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Substitutes placeholder tokens in `template` with values from `outputs`.
///
/// Missing keys become empty strings. Replaced text is never rescanned and
/// unrecognized tokens pass through unchanged.
#[must_use]
pub fn render(outputs: &OutputSet, template: &str) -> Rendered {
    let mut substituted = BTreeSet::new();
    let mut missing = BTreeSet::new();

    let text = PLACEHOLDER_PATTERN
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let Some(key) = key_for(&caps[0]) else {
                return caps[0].to_string();
            };
            if let Some(value) = outputs.get(key) {
                substituted.insert(key);
                value.to_string()
            } else {
                missing.insert(key);
                String::new()
            }
        })
        .into_owned();

    Rendered {
        text,
        substituted: substituted.into_iter().collect(),
        missing: missing.into_iter().collect(),
    }
}

/// What [`render_config`] wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Artifact path.
    pub destination: PathBuf,
    /// Keys that were substituted.
    pub substituted: Vec<OutputKey>,
    /// Keys that were rendered as empty strings.
    pub missing: Vec<OutputKey>,
    /// Size of the artifact.
    pub bytes_written: usize,
}

/// Renders `template_path` with `outputs` and writes the result to
/// `destination`, replacing any previous contents.
///
/// Parent directories of `destination` are created as needed.
pub fn render_config(
    outputs: &OutputSet,
    template_path: &Path,
    destination: &Path,
) -> Result<RenderReport> {
    let template = std::fs::read_to_string(template_path)?;
    let rendered = render(outputs, &template);

    for key in &rendered.missing {
        warn!(
            key = key.as_str(),
            destination = %destination.display(),
            "Output missing; placeholder rendered empty"
        );
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(destination, &rendered.text)?;

    info!(
        destination = %destination.display(),
        substituted = rendered.substituted.len(),
        missing = rendered.missing.len(),
        "Configuration written"
    );

    Ok(RenderReport {
        destination: destination.to_path_buf(),
        substituted: rendered.substituted,
        missing: rendered.missing,
        bytes_written: rendered.text.len(),
    })
}
