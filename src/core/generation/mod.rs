//! Structured Content Generation
//!
//! Turns a topic into a contract-shaped field map:
//! - `contract`: declared fields and the `[START_X]`/`[END_X]` delimiter protocol
//! - `extractor`: tolerant parsing of raw provider output
//! - `normalizer`: idempotent markup repair
//! - `prompt`: request assembly per flow
//! - `orchestrator`: the provider fallback state machine

pub mod contract;
pub mod errors;
pub mod extractor;
pub mod field_map;
pub mod markup;
pub mod normalizer;
pub mod orchestrator;
pub mod prompt;

pub use contract::{placeholder_token, Delimiters, FieldContract, FieldSpec};
pub use errors::{ContractError, GenerationError, GenerationResult};
pub use extractor::{extract_fields, extract_last};
pub use field_map::FieldMap;
pub use markup::{split_emphasis, strip_emphasis, strip_outer_emphasis, RichRun, EMPHASIS};
pub use normalizer::{LabelConfig, Normalizer, NormalizerConfig};
pub use orchestrator::{
    AttemptOutcome, AttemptRecord, GenerationOrchestrator, GenerationOutcome, GenerationRequest,
    YieldPolicy,
};
pub use prompt::PromptBuilder;
