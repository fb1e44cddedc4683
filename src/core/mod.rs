pub mod logging;
pub mod llm;

// Field contract, extraction, normalization and the fallback orchestrator
pub mod generation;

// End-to-end flows over generation and DOCX injection
pub mod pipeline;
