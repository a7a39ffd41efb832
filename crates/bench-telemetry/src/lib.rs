//! # Bench Telemetry
//!
//! Observability for the LLM Benchmark API.
//!
//! This crate provides:
//! - Structured logging via `tracing-subscriber` (text or JSON)
//! - Prometheus metrics for benchmark runs and provider calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LoggingConfig, TelemetryError};
pub use metrics::{BenchMetrics, CallOutcome};
