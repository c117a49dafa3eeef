//! Tests for placeholder rendering.

#[cfg(test)]
mod tests {
    use crate::core::{OutputKey, OutputSet};
    use crate::render::{render, render_config};
    use crate::testing::{sample_outputs, SAMPLE_ENV_TEMPLATE};
    use pretty_assertions::assert_eq;

    fn scenario_outputs() -> OutputSet {
        OutputSet::new()
            .with(OutputKey::S3BucketName, "abc-dev-assets-123")
            .with(OutputKey::SupervisorAgentId, "E4NLVBHEHI")
    }

    #[test]
    fn test_scenario_substitutes_two_lines() {
        let rendered = render(&scenario_outputs(), SAMPLE_ENV_TEMPLATE);

        let before: Vec<&str> = SAMPLE_ENV_TEMPLATE.lines().collect();
        let after: Vec<&str> = rendered.text.lines().collect();
        assert_eq!(before.len(), after.len());

        for (old, new) in before.iter().zip(&after) {
            match *old {
                "S3_BUCKET_NAME=your-marketing-assets-bucket" => {
                    assert_eq!(*new, "S3_BUCKET_NAME=abc-dev-assets-123");
                }
                "SUPERVISOR_AGENT_ID=your-supervisor-agent-id" => {
                    assert_eq!(*new, "SUPERVISOR_AGENT_ID=E4NLVBHEHI");
                }
                line if line.contains("=your-") => {
                    let (name, _) = line.split_once('=').unwrap();
                    assert_eq!(*new, format!("{name}="));
                }
                _ => assert_eq!(new, old),
            }
        }

        assert_eq!(
            rendered.substituted,
            vec![OutputKey::S3BucketName, OutputKey::SupervisorAgentId]
        );
        assert_eq!(
            rendered.missing,
            vec![
                OutputKey::ContentAgentId,
                OutputKey::VisualAgentId,
                OutputKey::KnowledgeBaseId,
                OutputKey::LogGroupName,
                OutputKey::BedrockAgentRoleArn,
            ]
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let first = render(&sample_outputs(), SAMPLE_ENV_TEMPLATE);
        let second = render(&sample_outputs(), SAMPLE_ENV_TEMPLATE);
        assert_eq!(first, second);
        assert!(first.is_complete());
    }

    #[test]
    fn test_unknown_placeholders_pass_through() {
        let template = "AGENT_ALIAS_ID=TSTALIASID\nOTHER=your-other-id\n";
        let rendered = render(&sample_outputs(), template);
        assert_eq!(rendered.text, template);
        assert!(rendered.substituted.is_empty());
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let outputs = OutputSet::new()
            .with(OutputKey::S3BucketName, "your-supervisor-agent-id")
            .with(OutputKey::SupervisorAgentId, "REAL");
        let rendered = render(&outputs, "A=your-marketing-assets-bucket\nB=your-supervisor-agent-id");
        assert_eq!(rendered.text, "A=your-supervisor-agent-id\nB=REAL");
    }

    #[test]
    fn test_repeated_placeholder_replaced_everywhere() {
        let outputs = OutputSet::new().with(OutputKey::KnowledgeBaseId, "KB1");
        let rendered = render(&outputs, "X=your-knowledge-base-id Y=your-knowledge-base-id");
        assert_eq!(rendered.text, "X=KB1 Y=KB1");
        assert_eq!(rendered.substituted, vec![OutputKey::KnowledgeBaseId]);
    }

    #[test]
    fn test_empty_outputs_blank_every_placeholder() {
        let rendered = render(&OutputSet::new(), SAMPLE_ENV_TEMPLATE);
        assert!(!rendered.text.contains("your-"));
        assert_eq!(rendered.missing, OutputKey::ALL.to_vec());
        assert!(rendered.text.contains("AGENT_ALIAS_ID=TSTALIASID"));
    }

    #[test]
    fn test_render_config_writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("env.template");
        std::fs::write(&template, SAMPLE_ENV_TEMPLATE).unwrap();
        let destination = dir.path().join("app").join(".env");

        let report = render_config(&scenario_outputs(), &template, &destination).unwrap();
        assert_eq!(report.destination, destination);
        assert_eq!(report.missing.len(), 5);

        let written = std::fs::read_to_string(&destination).unwrap();
        assert!(written.contains("S3_BUCKET_NAME=abc-dev-assets-123"));
        assert_eq!(report.bytes_written, written.len());

        render_config(&sample_outputs(), &template, &destination).unwrap();
        let rewritten = std::fs::read_to_string(&destination).unwrap();
        assert!(rewritten.contains("S3_BUCKET_NAME=marketing-agents-dev-assets-123"));
        assert!(!rewritten.contains("abc-dev-assets-123"));
    }

    #[test]
    fn test_render_config_missing_template_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_config(
            &sample_outputs(),
            &dir.path().join("nope.template"),
            &dir.path().join(".env"),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 7);
        assert!(!dir.path().join(".env").exists());
    }
}
