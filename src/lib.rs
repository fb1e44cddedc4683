//! Docweaver - structured-content generation and DOCX template injection
//!
//! Core library: provider chain with fallback, delimiter-protocol
//! extraction, markup normalization and WordprocessingML injection.

pub mod config;
pub mod core;
pub mod document;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
