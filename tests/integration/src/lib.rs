//! Integration tests for the LLM Benchmark API
//!
//! The full service runs on a loopback port against an in-memory SQLite
//! database, with a wiremock server standing in for the Anthropic API.

pub mod helpers;
pub mod mock_anthropic;

pub use helpers::*;
pub use mock_anthropic::*;

#[cfg(test)]
mod e2e_tests;
