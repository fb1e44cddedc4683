//! Document Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    /// The template bytes are not a readable DOCX package. Fatal, never retried.
    #[error("Template is not a valid DOCX document: {0}")]
    TemplateFormat(String),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
