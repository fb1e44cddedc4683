//! WordprocessingML paragraph scanner
//!
//! Streams `word/document.xml` and records, for every `w:p`, its exact byte
//! span, the span of its `w:pPr` and its text as emphasis-tagged runs. The
//! injector splices on these spans so untouched paragraphs keep their source
//! bytes; the reader uses the runs.

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::errors::{DocumentError, Result};
use crate::core::generation::RichRun;

/// One paragraph as found in the source XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpan {
    /// From `<w:p` to the end of `</w:p>` (or of `<w:p/>`)
    pub span: Range<usize>,
    /// Length of the `<w:p ...>` start tag
    pub open_tag_len: usize,
    /// Byte span of the paragraph's own `w:pPr`
    pub properties: Option<Range<usize>>,
    pub runs: Vec<RichRun>,
    /// Inside a table cell
    pub in_table: bool,
    /// Contains other paragraphs (text boxes); never rebuilt
    pub nested: bool,
}

impl ParagraphSpan {
    fn open(span_start: usize, open_tag_end: usize, in_table: bool) -> Self {
        Self {
            span: span_start..open_tag_end,
            open_tag_len: open_tag_end - span_start,
            properties: None,
            runs: Vec::new(),
            in_table,
            nested: false,
        }
    }

    /// Concatenated run text; tabs and breaks become `\t` and `\n`
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_self_closing(&self) -> bool {
        self.open_tag_len == self.span.len()
    }
}

/// Scanner state for a paragraph that has not been closed yet
struct OpenParagraph {
    paragraph: ParagraphSpan,
    run: Option<RichRun>,
    in_run_props: bool,
    in_text: bool,
    properties_start: Option<usize>,
}

impl OpenParagraph {
    fn new(paragraph: ParagraphSpan) -> Self {
        Self {
            paragraph,
            run: None,
            in_run_props: false,
            in_text: false,
            properties_start: None,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }
}

/// Scan every paragraph of a document part, ordered by position.
pub fn scan_paragraphs(xml: &[u8]) -> Result<Vec<ParagraphSpan>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut done: Vec<ParagraphSpan> = Vec::new();
    let mut table_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            DocumentError::TemplateFormat(format!(
                "XML error at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;
        // Just past the closing `>` for tag events
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(parent) = open.last_mut() {
                        parent.paragraph.nested = true;
                    }
                    let start = tag_start(xml, after);
                    open.push(OpenParagraph::new(ParagraphSpan::open(
                        start,
                        after,
                        table_depth > 0,
                    )));
                }
                b"w:tbl" => table_depth += 1,
                b"w:pPr" => {
                    if let Some(p) = open.last_mut().filter(|p| p.run.is_none()) {
                        p.properties_start = Some(tag_start(xml, after));
                    }
                }
                b"w:r" => {
                    if let Some(p) = open.last_mut() {
                        p.run = Some(RichRun::plain(""));
                    }
                }
                b"w:rPr" => {
                    if let Some(p) = open.last_mut().filter(|p| p.run.is_some()) {
                        p.in_run_props = true;
                    }
                }
                b"w:t" => {
                    if let Some(p) = open.last_mut().filter(|p| p.run.is_some()) {
                        p.in_text = true;
                    }
                }
                _ => {}
            },

            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(mut p) = open.pop() {
                        p.paragraph.span.end = after;
                        done.push(p.paragraph);
                    }
                }
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:pPr" => {
                    if let Some(p) = open.last_mut() {
                        if let Some(start) = p.properties_start.take() {
                            p.paragraph.properties = Some(start..after);
                        }
                    }
                }
                b"w:r" => {
                    if let Some(p) = open.last_mut() {
                        if let Some(run) = p.run.take() {
                            if !run.text.is_empty() {
                                p.paragraph.runs.push(run);
                            }
                        }
                        p.in_run_props = false;
                        p.in_text = false;
                    }
                }
                b"w:rPr" => {
                    if let Some(p) = open.last_mut() {
                        p.in_run_props = false;
                    }
                }
                b"w:t" => {
                    if let Some(p) = open.last_mut() {
                        p.in_text = false;
                    }
                }
                _ => {}
            },

            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(parent) = open.last_mut() {
                        parent.paragraph.nested = true;
                    }
                    let start = tag_start(xml, after);
                    done.push(ParagraphSpan::open(start, after, table_depth > 0));
                }
                b"w:pPr" => {
                    if let Some(p) = open.last_mut().filter(|p| p.run.is_none()) {
                        p.paragraph.properties = Some(tag_start(xml, after)..after);
                    }
                }
                b"w:b" => {
                    if let Some(p) = open.last_mut().filter(|p| p.in_run_props) {
                        if let Some(run) = p.run.as_mut() {
                            run.emphasized = is_toggle_on(&e);
                        }
                    }
                }
                b"w:tab" => {
                    if let Some(p) = open.last_mut().filter(|p| !p.in_run_props) {
                        p.push_text("\t");
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(p) = open.last_mut().filter(|p| !p.in_run_props) {
                        p.push_text("\n");
                    }
                }
                _ => {}
            },

            Event::Text(t) => {
                if let Some(p) = open.last_mut().filter(|p| p.in_text) {
                    let text = t
                        .unescape()
                        .map_err(|e| DocumentError::TemplateFormat(e.to_string()))?;
                    p.push_text(&text);
                }
            }

            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(DocumentError::TemplateFormat(format!(
            "{} paragraph(s) never closed",
            open.len()
        )));
    }

    done.sort_by_key(|p| p.span.start);
    Ok(done)
}

/// `<w:b/>` and friends are on unless `w:val` says otherwise.
fn is_toggle_on(e: &BytesStart<'_>) -> bool {
    match e.try_get_attribute("w:val") {
        Ok(Some(attr)) => !matches!(attr.value.as_ref(), b"0" | b"false" | b"off"),
        _ => true,
    }
}

/// Offset of the `<` opening the tag that ends at `end`.
fn tag_start(xml: &[u8], end: usize) -> usize {
    xml[..end].iter().rposition(|&b| b == b'<').unwrap_or(0)
}
