//! Crate-level tests
//!
//! - `common`: shared fixtures
//! - `mocks`: scripted providers
//! - `unit`: orchestrator, pipeline and provider HTTP tests
//! - `property`: proptest invariants

mod common;
mod mocks;
mod property;
mod unit;
