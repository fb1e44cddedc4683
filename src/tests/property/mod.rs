//! Property-based tests
//!
//! Invariants checked with proptest rather than specific cases.
//!
//! ## Test Modules
//!
//! - `extractor_props`: response extraction
//!   - The result always carries exactly the contract's keys
//!   - Well-formed values survive any field order and dropped end markers
//!   - Whole-value emphasis unwraps to the bare value
//!
//! - `normalizer_props`: markup normalization
//!   - Normalizing twice equals normalizing once
//!   - Visible text is preserved apart from inserted line breaks
//!
//! - `injector_props`: template injection
//!   - Paragraphs without tokens come back byte-identical

mod extractor_props;
mod injector_props;
