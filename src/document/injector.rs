//! Document Injector
//!
//! Fills a DOCX template with field values.
//!
//! Token mode: a paragraph (top level or inside any table cell) whose text
//! contains `{{ID}}` tokens is rebuilt as bold/plain runs with the values
//! substituted. The paragraph keeps its start tag and `w:pPr`; run formatting
//! other than emphasis is not carried over.
//!
//! Anchor mode: a field that declares anchor texts and whose token appears
//! nowhere gets a new paragraph inserted after the first paragraph whose
//! upper-cased text contains every anchor. Each field is anchored once.
//!
//! Every paragraph that matches neither mode keeps its exact source bytes.

use std::collections::HashSet;
use std::ops::Range;

use super::builder::{render_paragraph, render_runs};
use super::errors::Result;
use super::package::DocxPackage;
use super::scan::{scan_paragraphs, ParagraphSpan};
use crate::core::generation::contract::{PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN};
use crate::core::generation::{FieldContract, FieldMap};

/// What an injection pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// Paragraphs rebuilt because they held tokens
    pub rebuilt_paragraphs: usize,
    /// Fields whose token was found
    pub substituted_fields: Vec<String>,
    /// Fields inserted below an anchor paragraph
    pub anchored_fields: Vec<String>,
}

pub struct DocumentInjector;

impl DocumentInjector {
    /// Fill a template and return the new document bytes. The template slice
    /// is only read.
    pub fn inject(template: &[u8], contract: &FieldContract, values: &FieldMap) -> Result<Vec<u8>> {
        Self::inject_with_report(template, contract, values).map(|(bytes, _)| bytes)
    }

    pub fn inject_with_report(
        template: &[u8],
        contract: &FieldContract,
        values: &FieldMap,
    ) -> Result<(Vec<u8>, InjectionReport)> {
        let mut package = DocxPackage::from_bytes(template)?;
        let (xml, report) = Self::inject_xml(package.document_xml(), contract, values)?;

        log::info!(
            "Injected template: {} paragraphs rebuilt, {} fields by token, {} by anchor",
            report.rebuilt_paragraphs,
            report.substituted_fields.len(),
            report.anchored_fields.len()
        );

        package.set_document_xml(xml);
        Ok((package.to_bytes()?, report))
    }

    /// Inject into a `word/document.xml` body.
    pub fn inject_xml(
        xml: &[u8],
        contract: &FieldContract,
        values: &FieldMap,
    ) -> Result<(Vec<u8>, InjectionReport)> {
        let paragraphs = scan_paragraphs(xml)?;
        let mut edits: Vec<(Range<usize>, Vec<u8>)> = Vec::new();
        let mut report = InjectionReport::default();
        let mut found: HashSet<String> = HashSet::new();

        let candidates: Vec<&ParagraphSpan> = paragraphs
            .iter()
            .filter(|p| !p.nested && !p.is_self_closing())
            .collect();

        // Token mode
        for paragraph in &candidates {
            let text = paragraph.text();
            let Some((substituted, ids)) = substitute_tokens(&text, contract, values) else {
                continue;
            };

            let mut rebuilt = Vec::with_capacity(paragraph.span.len() + substituted.len());
            let start = paragraph.span.start;
            rebuilt.extend_from_slice(&xml[start..start + paragraph.open_tag_len]);
            if let Some(props) = &paragraph.properties {
                rebuilt.extend_from_slice(&xml[props.clone()]);
            }
            rebuilt.extend_from_slice(render_runs(&substituted).as_bytes());
            rebuilt.extend_from_slice(b"</w:p>");

            edits.push((paragraph.span.clone(), rebuilt));
            report.rebuilt_paragraphs += 1;
            found.extend(ids);
        }

        // Anchor mode
        for field in contract.fields() {
            if field.anchor.is_empty() || found.contains(&field.id) {
                continue;
            }
            let value = values.get(&field.id).unwrap_or_default();
            if value.trim().is_empty() {
                continue;
            }

            let anchors: Vec<String> = field.anchor.iter().map(|a| a.to_uppercase()).collect();
            let target = candidates.iter().find(|p| {
                let text = p.text().to_uppercase();
                anchors.iter().all(|a| text.contains(a.as_str()))
            });

            match target {
                Some(paragraph) => {
                    let end = paragraph.span.end;
                    edits.push((end..end, render_paragraph(value).into_bytes()));
                    report.anchored_fields.push(field.id.clone());
                }
                None => log::debug!("No anchor paragraph for field '{}'", field.id),
            }
        }

        for id in contract.ids() {
            if found.contains(id) {
                report.substituted_fields.push(id.to_string());
            }
        }

        Ok((apply_edits(xml, edits), report))
    }
}

/// Replace every contract token in `text`. Returns `None` when the text holds
/// no contract token; unknown `{{...}}` sequences are left as they are.
fn substitute_tokens(
    text: &str,
    contract: &FieldContract,
    values: &FieldMap,
) -> Option<(String, Vec<String>)> {
    let mut out = String::with_capacity(text.len());
    let mut ids = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(PLACEHOLDER_OPEN) {
        let after_open = &rest[open + PLACEHOLDER_OPEN.len()..];
        let Some(close) = after_open.find(PLACEHOLDER_CLOSE) else {
            break;
        };

        let id = &after_open[..close];
        if contract.contains(id) {
            out.push_str(&rest[..open]);
            out.push_str(values.get(id).unwrap_or_default());
            ids.push(id.to_string());
            rest = &after_open[close + PLACEHOLDER_CLOSE.len()..];
        } else {
            // Keep the opening braces and continue scanning after them
            out.push_str(&rest[..open + PLACEHOLDER_OPEN.len()]);
            rest = after_open;
        }
    }
    out.push_str(rest);

    if ids.is_empty() {
        None
    } else {
        Some((out, ids))
    }
}

/// Splice non-overlapping edits into the source. Insertions at a paragraph's
/// end sort before a replacement starting at the same offset.
fn apply_edits(xml: &[u8], mut edits: Vec<(Range<usize>, Vec<u8>)>) -> Vec<u8> {
    edits.sort_by_key(|(range, _)| (range.start, range.end));

    let mut out = Vec::with_capacity(xml.len() + edits.iter().map(|(_, b)| b.len()).sum::<usize>());
    let mut cursor = 0;
    for (range, bytes) in edits {
        out.extend_from_slice(&xml[cursor..range.start]);
        out.extend_from_slice(&bytes);
        cursor = range.end;
    }
    out.extend_from_slice(&xml[cursor..]);
    out
}
