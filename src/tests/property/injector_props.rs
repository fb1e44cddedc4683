//! Property-based tests for template injection

use proptest::prelude::*;

use crate::core::generation::{FieldContract, FieldMap};
use crate::document::{DocumentInjector, DocxBuilder};

/// Paragraph text that can never contain a placeholder token
fn arb_paragraph() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:;!?<>&'-]{0,60}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Without tokens or anchors nothing is rewritten, down to the byte
    #[test]
    fn prop_token_free_body_is_byte_identical(
        paragraphs in prop::collection::vec(arb_paragraph(), 0..12),
        cells in prop::collection::vec(arb_paragraph(), 0..4),
    ) {
        let mut builder = paragraphs
            .iter()
            .fold(DocxBuilder::new(), |b, text| b.paragraph(text));
        if !cells.is_empty() {
            builder = builder.table(vec![cells.clone()]);
        }
        let xml = builder.document_xml();

        let contract = FieldContract::from_ids(["SUMMARY", "ANALYSIS"]).unwrap();
        let values = FieldMap::conform(&contract, [("SUMMARY", "text"), ("ANALYSIS", "more")]);
        let (out, report) = DocumentInjector::inject_xml(xml.as_bytes(), &contract, &values).unwrap();

        prop_assert_eq!(report.rebuilt_paragraphs, 0);
        prop_assert_eq!(out, xml.into_bytes());
    }

    /// Every token paragraph is rebuilt and the token never survives
    #[test]
    fn prop_tokens_always_replaced(
        before in arb_paragraph(),
        after in arb_paragraph(),
        value in "[a-zA-Z0-9 .,]{0,40}",
    ) {
        let xml = DocxBuilder::new()
            .paragraph(&format!("{before}{{{{SUMMARY}}}}{after}"))
            .document_xml();

        let contract = FieldContract::from_ids(["SUMMARY"]).unwrap();
        let values = FieldMap::conform(&contract, [("SUMMARY", value.as_str())]);
        let (out, report) = DocumentInjector::inject_xml(xml.as_bytes(), &contract, &values).unwrap();

        prop_assert_eq!(report.rebuilt_paragraphs, 1);
        let out = String::from_utf8(out).unwrap();
        prop_assert!(!out.contains("{{SUMMARY}}"));
    }
}
