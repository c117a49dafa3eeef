//! Placeholder tokens and the output keys that replace them.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::OutputKey;

/// Placeholder tokens shipped in the environment template.
pub const PLACEHOLDERS: [(&str, OutputKey); 7] = [
    ("your-marketing-assets-bucket", OutputKey::S3BucketName),
    ("your-supervisor-agent-id", OutputKey::SupervisorAgentId),
    ("your-content-agent-id", OutputKey::ContentAgentId),
    ("your-visual-agent-id", OutputKey::VisualAgentId),
    ("your-knowledge-base-id", OutputKey::KnowledgeBaseId),
    ("your-log-group-name", OutputKey::LogGroupName),
    ("your-bedrock-agent-role-arn", OutputKey::BedrockAgentRoleArn),
];

/// One alternation over every placeholder, longest first.
pub(super) static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut tokens: Vec<&str> = PLACEHOLDERS.iter().map(|(token, _)| *token).collect();
    tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("valid regex")
});

/// Returns the output key a placeholder token stands for.
#[must_use]
pub fn key_for(token: &str) -> Option<OutputKey> {
    PLACEHOLDERS
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, key)| *key)
}
