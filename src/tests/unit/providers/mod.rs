//! LLM Provider Unit Tests
//!
//! Uses wiremock for HTTP mocking to test:
//! - API request formatting
//! - Response parsing (success and error cases)
//! - Status code to `LLMError` mapping
//! - Model listing and its fallback

mod cohere_tests;
mod google_tests;
