//! # Bench Core
//!
//! Core types, metric calculation and error handling for the LLM Benchmark API.
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Benchmark job and prompt result domain types
//! - Request and response payloads for the HTTP API
//! - Cost and throughput calculation from per-model pricing
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod job;
pub mod metrics;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error::{BenchError, BenchResult, FieldError};
pub use job::{BenchmarkJob, BenchmarkStatus, JobSummary, NewPromptResult, PromptResult, TASK_FAILED_PROMPT};
pub use metrics::{
    calculate_cost, calculate_tokens_per_second, is_known_model, pricing_for, ModelPricing,
    DEFAULT_PRICING,
};
pub use request::{CreateBenchmarkRequest, ListParams, DEFAULT_MODEL};
pub use response::{BenchmarkResponse, BenchmarkResultResponse, BenchmarkSummary};
