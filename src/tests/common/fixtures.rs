//! Test Fixtures
//!
//! Contracts, provider responses and templates shared by the unit tests.

use crate::core::generation::{FieldContract, FieldSpec};
use crate::document::DocxBuilder;

pub const TOPIC: &str = "time management in distributed teams";

// =============================================================================
// Contracts
// =============================================================================

/// Three-field contract matching [`sample_template`]
pub fn sample_contract() -> FieldContract {
    FieldContract::new(vec![
        FieldSpec::new("SUMMARY").with_guidance("One paragraph."),
        FieldSpec::new("ANALYSIS").with_guidance("Aspect 1:, Aspect 2: with a Rationale: each."),
        FieldSpec::new("MEMORIAL").with_anchor(["MEMORIAL"]),
    ])
    .expect("valid sample contract")
}

/// Contract with fields `F1..=Fn`
pub fn wide_contract(n: usize) -> FieldContract {
    FieldContract::from_ids((1..=n).map(|i| format!("F{}", i))).expect("valid wide contract")
}

// =============================================================================
// Responses
// =============================================================================

/// Delimiter-protocol response carrying `pairs` in order
pub fn delimited_response(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(id, value)| format!("[START_{id}]\n{value}\n[END_{id}]\n"))
        .collect()
}

/// Response for [`wide_contract`] with only the first `filled` fields present
pub fn partial_response(filled: usize) -> String {
    (1..=filled)
        .map(|i| format!("[START_F{i}]value {i}[END_F{i}]\n"))
        .collect()
}

/// A complete, well-behaved response for [`sample_contract`]
pub fn sample_response() -> String {
    delimited_response(&[
        (
            "SUMMARY",
            "Summary: the team spans four time zones and misses handoffs.",
        ),
        (
            "ANALYSIS",
            "Aspect 1: overlapping hours. Rationale: decisions wait a full day.",
        ),
        (
            "MEMORIAL",
            "Context: a product team of nine.\nReflective conclusion: async by default.",
        ),
    ])
}

// =============================================================================
// Templates
// =============================================================================

/// Template with one token in a plain paragraph, one in a table cell and one
/// in a paragraph below a bold heading.
pub fn sample_template() -> Vec<u8> {
    DocxBuilder::new()
        .heading("Professional Challenge")
        .paragraph("Read the case and complete each step.")
        .paragraph("{{SUMMARY}}")
        .table(vec![vec!["Analysis", "{{ANALYSIS}}"]])
        .paragraph("**MEMORIAL**")
        .paragraph("{{MEMORIAL}}")
        .paragraph("Submit before the deadline.")
        .build()
        .expect("sample template builds")
}
