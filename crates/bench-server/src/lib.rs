//! # Bench Server
//!
//! HTTP API for creating, running, listing and deleting benchmarks.
//!
//! This crate provides:
//! - Axum router with the `/benchmarks` resource
//! - Root, health and Prometheus metrics endpoints
//! - Request id, tracing and CORS middleware
//! - JSON error envelope shared by every failure
//! - Graceful shutdown on Ctrl-C / SIGTERM

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use routes::create_router;
pub use server::{Server, ServerConfig, ServerError};
pub use state::AppState;
