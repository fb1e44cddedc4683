//! DOCX Package
//!
//! A DOCX file is a ZIP archive of XML parts. Only `word/document.xml` is ever
//! rewritten; every other entry is copied raw, so its compressed bytes come
//! out identical.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::errors::{DocumentError, Result};

/// Main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

/// In-memory copy of a DOCX template. The caller's bytes are never touched.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    source: Vec<u8>,
    document_xml: Vec<u8>,
}

impl DocxPackage {
    /// Open a package and read its main document part.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = open_archive(bytes)?;
        let document_xml = read_entry(&mut archive, DOCUMENT_PART)?;

        log::debug!(
            "Opened DOCX package: {} entries, document.xml {} bytes",
            archive.len(),
            document_xml.len()
        );

        Ok(Self {
            source: bytes.to_vec(),
            document_xml,
        })
    }

    pub fn document_xml(&self) -> &[u8] {
        &self.document_xml
    }

    pub fn set_document_xml(&mut self, xml: Vec<u8>) {
        self.document_xml = xml;
    }

    /// Entry names in archive order
    pub fn part_names(&self) -> Result<Vec<String>> {
        let mut archive = open_archive(&self.source)?;
        (0..archive.len())
            .map(|i| Ok(archive.by_index_raw(i)?.name().to_string()))
            .collect()
    }

    /// Raw (decompressed) content of any part as it was in the source
    pub fn read_part(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = open_archive(&self.source)?;
        read_entry(&mut archive, name)
    }

    /// Serialize: the current document part plus every other source entry.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut archive = open_archive(&self.source)?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.name() == DOCUMENT_PART {
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(&self.document_xml)?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::TemplateFormat(format!("cannot open package: {}", e)))
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| DocumentError::TemplateFormat(format!("cannot find {}: {}", name, e)))?;

    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .map_err(|e| DocumentError::TemplateFormat(format!("cannot read {}: {}", name, e)))?;
    Ok(content)
}
