//! # Bench Runner
//!
//! Fans every prompt of a benchmark out to the provider at once, waits for
//! all of them to settle and records the outcome in a single transaction.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod runner;

pub use runner::BenchmarkRunner;
