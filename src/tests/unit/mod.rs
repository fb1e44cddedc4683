//! Unit tests that span several modules

mod pipeline_tests;
mod providers;
