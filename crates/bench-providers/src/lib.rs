//! # Bench Providers
//!
//! LLM provider access for the benchmark runner.
//!
//! This crate provides:
//! - The [`LlmProvider`] trait: one streaming request, yielding text and usage events
//! - [`AnthropicProvider`]: the Anthropic Messages API over Server-Sent Events
//! - [`call_streaming`]: measures TTFT, latency, throughput and cost for a
//!   single prompt and folds every failure into the returned [`LlmCallOutcome`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod call;
pub mod error;
pub mod provider;
pub mod sse;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export main types
pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use call::{call_streaming, LlmCallOutcome};
pub use error::ProviderError;
pub use provider::{EventStream, LlmProvider, MessageRequest, StreamEvent, TokenUsage};
