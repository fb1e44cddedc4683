//! Common Test Utilities
//!
//! Shared fixtures used across test modules:
//! - Field contracts and delimiter-protocol responses
//! - DOCX templates built in memory

pub mod fixtures;

pub use fixtures::*;
