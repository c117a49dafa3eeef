//! Stack output keys and the output set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Output keys the downstream application depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputKey {
    /// Marketing assets bucket.
    S3BucketName,
    /// Supervisor agent identifier.
    SupervisorAgentId,
    /// Content agent identifier.
    ContentAgentId,
    /// Visual agent identifier.
    VisualAgentId,
    /// Knowledge base identifier.
    KnowledgeBaseId,
    /// Application log group.
    LogGroupName,
    /// Role assumed by the agents.
    BedrockAgentRoleArn,
}

impl OutputKey {
    /// All recognized keys.
    pub const ALL: [Self; 7] = [
        Self::S3BucketName,
        Self::SupervisorAgentId,
        Self::ContentAgentId,
        Self::VisualAgentId,
        Self::KnowledgeBaseId,
        Self::LogGroupName,
        Self::BedrockAgentRoleArn,
    ];

    /// Output key as declared in the template.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::S3BucketName => "S3BucketName",
            Self::SupervisorAgentId => "SupervisorAgentId",
            Self::ContentAgentId => "ContentAgentId",
            Self::VisualAgentId => "VisualAgentId",
            Self::KnowledgeBaseId => "KnowledgeBaseId",
            Self::LogGroupName => "LogGroupName",
            Self::BedrockAgentRoleArn => "BedrockAgentRoleArn",
        }
    }

    /// Looks up a key by its template spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named values a stack exposes after provisioning.
///
/// Keys are stored by their template spelling so outputs the crate does not
/// know about are kept too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputSet {
    values: BTreeMap<String, String>,
}

impl OutputSet {
    /// Creates an empty output set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw output.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Adds an output, builder style.
    #[must_use]
    pub fn with(mut self, key: OutputKey, value: impl Into<String>) -> Self {
        self.insert(key.as_str(), value);
        self
    }

    /// Returns the value for a recognized key.
    #[must_use]
    pub fn get(&self, key: OutputKey) -> Option<&str> {
        self.values.get(key.as_str()).map(String::as_str)
    }

    /// Returns the value for any key.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Recognized keys that are not present.
    #[must_use]
    pub fn missing(&self) -> Vec<OutputKey> {
        OutputKey::ALL
            .into_iter()
            .filter(|k| !self.values.contains_key(k.as_str()))
            .collect()
    }

    /// Iterates over all outputs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no outputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OutputSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_key_names() {
        for key in OutputKey::ALL {
            assert_eq!(OutputKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(OutputKey::from_name("SomethingElse"), None);
    }

    #[test]
    fn test_missing_keys() {
        let outputs = OutputSet::new()
            .with(OutputKey::S3BucketName, "abc-dev-assets-123")
            .with(OutputKey::SupervisorAgentId, "E4NLVBHEHI");

        let missing = outputs.missing();
        assert_eq!(missing.len(), OutputKey::ALL.len() - 2);
        assert!(!missing.contains(&OutputKey::S3BucketName));
        assert!(missing.contains(&OutputKey::KnowledgeBaseId));
    }

    #[test]
    fn test_unrecognized_outputs_are_kept() {
        let outputs: OutputSet = [("ApiEndpoint", "https://example"), ("S3BucketName", "b")]
            .into_iter()
            .collect();
        assert_eq!(outputs.get_raw("ApiEndpoint"), Some("https://example"));
        assert_eq!(outputs.get(OutputKey::S3BucketName), Some("b"));
        assert_eq!(outputs.len(), 2);
    }

    #[test]
    fn test_serializes_as_map() {
        let outputs = OutputSet::new().with(OutputKey::LogGroupName, "/aws/marketing");
        let json = serde_json::to_value(&outputs).unwrap();
        assert_eq!(json, serde_json::json!({"LogGroupName": "/aws/marketing"}));
    }
}
