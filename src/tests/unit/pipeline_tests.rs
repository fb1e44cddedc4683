//! Document Pipeline Tests
//!
//! Generate → normalize → inject over in-memory templates, with scripted
//! providers standing in for the network.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::core::generation::{FieldMap, GenerationError, GenerationOrchestrator};
use crate::core::pipeline::{DocumentPipeline, PipelineError};
use crate::document::{DocumentError, DocxPackage, DocxReader, Paragraph, ANSWER_KEY_TITLE};
use crate::tests::common::*;
use crate::tests::mocks::{chain_of, ScriptedProvider};

const DEADLINE: Duration = Duration::from_secs(5);

fn pipeline() -> DocumentPipeline {
    DocumentPipeline::new(GenerationOrchestrator::default(), Arc::new(sample_contract()))
}

fn texts(bytes: &[u8]) -> Vec<String> {
    DocxReader::read_paragraphs(bytes)
        .unwrap()
        .iter()
        .map(Paragraph::text)
        .collect()
}

#[tokio::test]
async fn test_fill_template_replaces_every_token() {
    let provider = Arc::new(ScriptedProvider::replying("p1", sample_response()));
    let template = sample_template();

    let filled = pipeline()
        .fill_template(TOPIC, &template, chain_of(&[provider], DEADLINE))
        .await
        .unwrap();

    assert_eq!(filled.provider, "p1/p1-model");
    assert_eq!(filled.attempts.len(), 1);
    assert_eq!(filled.field_map.non_empty_count(), 3);

    let text = DocxReader::extract_text(&filled.bytes).unwrap();
    assert!(!text.contains("{{"));
    assert!(!text.contains("**"));
    assert!(text.contains("the team spans four time zones"));
    assert!(text.contains("Submit before the deadline."));

    let paragraphs = DocxReader::read_paragraphs(&filled.bytes).unwrap();
    let analysis = paragraphs
        .iter()
        .find(|p| p.text().contains("overlapping hours"))
        .unwrap();
    assert!(analysis.in_table);
    assert_eq!(analysis.emphasized_text(), vec!["Aspect 1:", "Rationale:"]);
}

#[tokio::test]
async fn test_fill_template_leaves_other_parts_untouched() {
    let provider = Arc::new(ScriptedProvider::replying("p1", sample_response()));
    let template = sample_template();

    let filled = pipeline()
        .fill_template(TOPIC, &template, chain_of(&[provider], DEADLINE))
        .await
        .unwrap();

    let before = DocxPackage::from_bytes(&template).unwrap();
    let after = DocxPackage::from_bytes(&filled.bytes).unwrap();
    assert_eq!(before.part_names().unwrap(), after.part_names().unwrap());
    assert_eq!(
        before.read_part("word/styles.xml").unwrap(),
        after.read_part("word/styles.xml").unwrap()
    );
    assert_eq!(texts(&template).len(), texts(&filled.bytes).len());
}

#[tokio::test]
async fn test_unreadable_template_fails_before_any_call() {
    let provider = Arc::new(ScriptedProvider::replying("p1", sample_response()));

    let result = pipeline()
        .fill_template(
            TOPIC,
            b"definitely not a zip",
            chain_of(&[provider.clone()], DEADLINE),
        )
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Document(DocumentError::TemplateFormat(_)))
    ));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_is_reported() {
    let provider = Arc::new(ScriptedProvider::failing("p1", 503));

    let result = pipeline()
        .fill_template(TOPIC, &sample_template(), chain_of(&[provider], DEADLINE))
        .await;

    match result {
        Err(PipelineError::Generation(e @ GenerationError::ExhaustedProviders { .. })) => {
            assert_eq!(e.provider(), Some("p1/p1-model"));
        }
        other => panic!("expected exhausted providers, got {:?}", other.map(|f| f.provider)),
    }
}

#[tokio::test]
async fn test_regenerate_field_refills_whole_map() {
    let provider = Arc::new(ScriptedProvider::replying(
        "p1",
        delimited_response(&[("MEMORIAL", "Summary: rewritten memorial.")]),
    ));
    let prior = FieldMap::conform(
        &sample_contract(),
        [
            ("SUMMARY", "Kept summary."),
            ("ANALYSIS", "Kept analysis."),
            ("MEMORIAL", "Old memorial."),
        ],
    );

    let filled = pipeline()
        .regenerate_field(
            TOPIC,
            &sample_template(),
            prior,
            "MEMORIAL",
            Some("Shorter, please."),
            chain_of(&[provider], DEADLINE),
        )
        .await
        .unwrap();

    assert_eq!(
        filled.field_map.get("MEMORIAL"),
        Some("**Summary:**\nrewritten memorial.")
    );
    let text = DocxReader::extract_text(&filled.bytes).unwrap();
    assert!(text.contains("Kept summary."));
    assert!(text.contains("Kept analysis."));
    assert!(text.contains("Summary:\nrewritten memorial."));
    assert!(!text.contains("Old memorial."));
}

#[test]
fn test_inject_normalizes_before_rendering() {
    let map = FieldMap::conform(
        &sample_contract(),
        [("SUMMARY", "**Context: remote team**"), ("ANALYSIS", "")],
    );

    let bytes = pipeline().inject(&sample_template(), &map).unwrap();
    let paragraphs = DocxReader::read_paragraphs(&bytes).unwrap();

    let context = paragraphs
        .iter()
        .find(|p| p.text().starts_with("Context:"))
        .unwrap();
    assert_eq!(context.text(), "Context:\nremote team");
    assert_eq!(context.emphasized_text(), vec!["Context:"]);

    // Empty values clear the token
    let text = DocxReader::extract_text(&bytes).unwrap();
    assert!(!text.contains("{{ANALYSIS}}"));
}

#[test]
fn test_inject_conforms_a_deserialized_map() {
    // A hand-edited map: MEMORIAL missing, one undeclared key
    let map: FieldMap = serde_json::from_str(
        r#"{ "SUMMARY": "Kept summary.", "ANALYSIS": "Kept analysis.", "NOTES": "stray" }"#,
    )
    .unwrap();
    assert_eq!(map.len(), 3);

    let bytes = pipeline().inject(&sample_template(), &map).unwrap();
    let text = DocxReader::extract_text(&bytes).unwrap();

    assert!(text.contains("Kept summary."));
    assert!(text.contains("Kept analysis."));
    assert!(!text.contains("{{MEMORIAL}}"));
    assert!(!text.contains("stray"));
}

#[tokio::test]
async fn test_answer_key_is_a_new_document() {
    let provider = Arc::new(ScriptedProvider::replying(
        "p1",
        "**Summary:** distributed teams lose time at handoffs\nAnalysis in plain text",
    ));
    let chain = chain_of(&[provider.clone()], DEADLINE);

    let key = pipeline()
        .answer_key(TOPIC, &sample_template(), &chain)
        .await
        .unwrap();

    assert_eq!(
        texts(&key.bytes),
        vec![
            ANSWER_KEY_TITLE.to_string(),
            "Summary: distributed teams lose time at handoffs".to_string(),
            "Analysis in plain text".to_string(),
        ]
    );
    assert!(key.text.starts_with("**Summary:**"));

    // The template's own text went into the prompt
    let prompt = provider.last_prompt().unwrap();
    assert!(prompt.contains("Read the case and complete each step."));
    assert!(prompt.contains("{{SUMMARY}}"));
}
