//! DOCX Builder
//!
//! Writes small documents from scratch: the answer-key output, and fixture
//! templates in tests. Paragraph text uses the same `**` emphasis markup as
//! injected values.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::errors::Result;
use super::package::DOCUMENT_PART;
use crate::core::generation::{split_emphasis, RichRun};

/// Heading placed on top of every answer key
pub const ANSWER_KEY_TITLE: &str = "Answer Key - Professional Challenge";

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"</Types>"#
);

const PACKAGE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>"#,
    r#"<w:rPr><w:b/><w:bCs/><w:sz w:val="32"/></w:rPr></w:style>"#,
    r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/></w:style>"#,
    r#"</w:styles>"#
);

const DOCUMENT_OPEN: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#
);

const DOCUMENT_CLOSE: &str = concat!(
    r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
    r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>"#,
    r#"</w:sectPr></w:body></w:document>"#
);

// ============================================================================
// Run rendering
// ============================================================================

/// One `w:r` element; emphasized runs carry `w:b`/`w:bCs`.
pub fn render_run(run: &RichRun) -> String {
    let text = escape(run.text.as_str());
    if run.emphasized {
        format!(
            r#"<w:r><w:rPr><w:b/><w:bCs/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
            text
        )
    } else {
        format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
    }
}

/// Runs for a marked-up value: one run per emphasis segment, with a break run
/// between lines and none after the last.
pub fn render_runs(text: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:r><w:br/></w:r>");
        }
        for run in split_emphasis(line.trim_end_matches('\r')) {
            out.push_str(&render_run(&run));
        }
    }
    out
}

/// A complete paragraph with default properties
pub fn render_paragraph(text: &str) -> String {
    format!("<w:p>{}</w:p>", render_runs(text))
}

// ============================================================================
// Builder
// ============================================================================

/// Accumulates body content and writes a minimal, valid package.
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: String,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(mut self, text: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>{}</w:p>"#,
            render_run(&RichRun::plain(text))
        ));
        self
    }

    /// Paragraph from `**`-marked text
    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&render_paragraph(text));
        self
    }

    /// Paragraph whose runs are given explicitly, for splitting text across runs
    pub fn paragraph_runs(mut self, runs: &[RichRun]) -> Self {
        self.body.push_str("<w:p>");
        for run in runs {
            self.body.push_str(&render_run(run));
        }
        self.body.push_str("</w:p>");
        self
    }

    /// Table of single-paragraph cells
    pub fn table<R, C>(mut self, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        self.body.push_str(r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>"#);
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in row {
                self.body.push_str("<w:tc>");
                self.body.push_str(&render_paragraph(cell.as_ref()));
                self.body.push_str("</w:tc>");
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    pub fn document_xml(&self) -> String {
        format!("{}{}{}", DOCUMENT_OPEN, self.body, DOCUMENT_CLOSE)
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            (DOCUMENT_PART, self.document_xml()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", STYLES.to_string()),
        ];
        for (name, content) in parts {
            writer.start_file(name, options)?;
            writer.write_all(content.as_bytes())?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Answer-key document: a heading, then one paragraph per non-empty line.
pub fn build_answer_key(title: &str, text: &str) -> Result<Vec<u8>> {
    let builder = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(DocxBuilder::new().heading(title), |b, line| b.paragraph(line));

    log::debug!("Building answer key with title '{}'", title);
    builder.build()
}
