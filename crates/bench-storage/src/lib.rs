//! # Bench Storage
//!
//! Persistence for benchmark jobs and their per-prompt results.
//!
//! Works against SQLite or PostgreSQL through `sqlx::AnyPool`; the dialect is
//! chosen from the connection URL. Tables are created on startup if absent.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod pool;
pub mod repository;
pub mod schema;

pub use config::DatabaseType;
pub use error::{Result, StorageError};
pub use pool::{DatabasePool, PoolConfig, PoolStats};
pub use repository::{BenchmarkRepository, RunRecord};
pub use schema::create_schema;
