//! Response Extractor
//!
//! Parses raw provider text against a field contract.
//!
//! A field's content runs from its start delimiter to whichever comes first:
//! its own end delimiter, the start delimiter of any other field, or the end
//! of the text. Providers regularly drop closing markers, so a start/end-only
//! match would merge or lose fields.

use super::contract::{FieldContract, FieldSpec};
use super::field_map::FieldMap;
use super::markup::strip_outer_emphasis;

/// Extract every contract field from `raw`. Never fails: a field whose start
/// delimiter is absent maps to the empty string.
pub fn extract_fields(raw: &str, contract: &FieldContract) -> FieldMap {
    let text = strip_code_fence(raw);
    let mut map = FieldMap::empty_for(contract);

    for field in contract.fields() {
        let start = field.delimiters().start;
        let Some(pos) = text.find(&start) else {
            log::debug!("No start delimiter for field '{}'", field.id);
            continue;
        };

        let value = value_after(text, pos, field, contract);
        // Every key comes from the contract, so this cannot miss
        let _ = map.set(&field.id, value);
    }

    log::debug!(
        "Extracted {}/{} non-empty fields from {} bytes",
        map.non_empty_count(),
        contract.len(),
        raw.len()
    );
    map
}

/// Extract a single field, reading from the *last* occurrence of its start
/// delimiter. Used for regeneration, where a provider may echo the current
/// document before writing its rewrite. Unknown or absent fields yield "".
pub fn extract_last(raw: &str, contract: &FieldContract, id: &str) -> String {
    let Some(field) = contract.field(id) else {
        return String::new();
    };
    let text = strip_code_fence(raw);
    match text.rfind(&field.delimiters().start) {
        Some(pos) => value_after(text, pos, field, contract),
        None => String::new(),
    }
}

/// Content of the field whose start delimiter begins at `pos`, bounded by its
/// end delimiter, any other field's start delimiter or the end of the text.
fn value_after(text: &str, pos: usize, field: &FieldSpec, contract: &FieldContract) -> String {
    let delims = field.delimiters();
    let rest = &text[pos + delims.start.len()..];

    let mut end = rest.find(&delims.end).unwrap_or(rest.len());
    for other in contract.fields().iter().filter(|f| f.id != field.id) {
        if let Some(i) = rest.find(&other.delimiters().start) {
            end = end.min(i);
        }
    }
    strip_outer_emphasis(&rest[..end])
}

/// Drop a Markdown code fence wrapped around the whole response.
fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(i) => &text[i + 1..],
            None => "",
        };
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }
    text
}
