//! DOCX Documents
//!
//! Template filling and the small amount of WordprocessingML handling it needs:
//! - `package`: ZIP container, rewrites only `word/document.xml`
//! - `scan`: byte-span paragraph scanner over `document.xml`
//! - `injector`: token and anchor injection
//! - `reader`: paragraph and plain-text view
//! - `builder`: new documents (answer keys)

pub mod builder;
pub mod errors;
pub mod injector;
pub mod package;
pub mod reader;
pub mod scan;

pub use builder::{build_answer_key, DocxBuilder, ANSWER_KEY_TITLE};
pub use errors::{DocumentError, Result};
pub use injector::{DocumentInjector, InjectionReport};
pub use package::{DocxPackage, DOCUMENT_PART};
pub use reader::{DocxReader, Paragraph};
