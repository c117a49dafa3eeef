//! Settings file model and loader.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{Result, StackpilotError};
use crate::polling::PollConfig;
use crate::provider::CAPABILITY_NAMED_IAM;

/// Defaults an operator can pin in a settings file.
///
/// ```json
/// {
///   "template_path": "infra/cloudformation-template.yaml",
///   "env_output_path": "app/.env",
///   "poll": { "initial_interval_ms": 2000, "timeout_secs": 1800 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Poll loop tuning.
    pub poll: PollConfig,
    /// Declarative template forwarded to the provider.
    pub template_path: PathBuf,
    /// Placeholder-bearing environment template.
    pub env_template_path: PathBuf,
    /// Where the rendered configuration is written.
    pub env_output_path: PathBuf,
    /// Capabilities acknowledged on every mutation.
    pub capabilities: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            template_path: PathBuf::from("cloudformation-template.yaml"),
            env_template_path: PathBuf::from(".env.template"),
            env_output_path: PathBuf::from(".env"),
            capabilities: vec![CAPABILITY_NAMED_IAM.to_string()],
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or returns the defaults when no path is given.
    ///
    /// Fields absent from the file keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            StackpilotError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = Self::from_json(&raw)
            .map_err(|e| StackpilotError::Config(format!("{}: {e}", path.display())))?;
        settings
            .validate()
            .map_err(|e| StackpilotError::Config(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Checks the poll bounds: a non-zero first interval that the cap does not undercut.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let poll = &self.poll;
        if poll.initial_interval_ms == 0 {
            return Err("poll.initial_interval_ms must be greater than zero".to_string());
        }
        if poll.max_interval_ms < poll.initial_interval_ms {
            return Err(format!(
                "poll.max_interval_ms ({}) must not be below poll.initial_interval_ms ({})",
                poll.max_interval_ms, poll.initial_interval_ms
            ));
        }
        Ok(())
    }

    /// Parses settings from JSON text.
    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.capabilities, vec!["CAPABILITY_NAMED_IAM".to_string()]);
        assert_eq!(settings.poll.timeout_secs, 3_600);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(
            r#"{"env_output_path": "app/.env", "poll": {"timeout_secs": 600}}"#,
        )
        .unwrap();

        assert_eq!(settings.env_output_path, PathBuf::from("app/.env"));
        assert_eq!(settings.poll.timeout_secs, 600);
        assert_eq!(settings.poll.initial_interval_ms, 5_000);
        assert_eq!(settings.template_path, PathBuf::from("cloudformation-template.yaml"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Settings::from_json(r#"{"tempalte_path": "x"}"#).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackpilot.json");
        std::fs::write(&path, r#"{"template_path": "infra/stack.yaml"}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.template_path, PathBuf::from("infra/stack.yaml"));
    }

    #[test]
    fn test_zero_initial_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackpilot.json");
        std::fs::write(&path, r#"{"poll": {"initial_interval_ms": 0}}"#).unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, StackpilotError::Config(_)));
        assert!(err.to_string().contains("initial_interval_ms"));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_max_below_initial_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackpilot.json");
        std::fs::write(
            &path,
            r#"{"poll": {"initial_interval_ms": 10000, "max_interval_ms": 2000}}"#,
        )
        .unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, StackpilotError::Config(_)));
        assert!(err.to_string().contains("max_interval_ms"));
    }

    #[test]
    fn test_default_poll_bounds_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, StackpilotError::Config(_)));
        assert_eq!(err.exit_code(), 7);

        let missing = Settings::load(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(missing, StackpilotError::Config(_)));
    }
}
