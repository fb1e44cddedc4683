//! DOCX Reader
//!
//! Read-only view of a document's paragraphs, including table cells.

use super::errors::Result;
use super::package::DocxPackage;
use super::scan::scan_paragraphs;
use crate::core::generation::RichRun;

/// A paragraph as rendered runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<RichRun>,
    pub in_table: bool,
}

impl Paragraph {
    /// Plain text, line breaks as `\n`
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Text of the emphasized runs
    pub fn emphasized_text(&self) -> Vec<&str> {
        self.runs
            .iter()
            .filter(|r| r.emphasized)
            .map(|r| r.text.as_str())
            .collect()
    }
}

pub struct DocxReader;

impl DocxReader {
    /// Every paragraph in document order, empty ones included
    pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<Paragraph>> {
        let package = DocxPackage::from_bytes(bytes)?;
        let paragraphs = scan_paragraphs(package.document_xml())?
            .into_iter()
            .filter(|p| !p.nested)
            .map(|p| Paragraph {
                runs: p.runs,
                in_table: p.in_table,
            })
            .collect();
        Ok(paragraphs)
    }

    /// Non-empty paragraph texts joined by newlines
    pub fn extract_text(bytes: &[u8]) -> Result<String> {
        let texts: Vec<String> = Self::read_paragraphs(bytes)?
            .iter()
            .map(Paragraph::text)
            .filter(|t| !t.trim().is_empty())
            .collect();
        Ok(texts.join("\n"))
    }

    pub fn paragraph_count(bytes: &[u8]) -> Result<usize> {
        Ok(Self::read_paragraphs(bytes)?.len())
    }
}
