//! Storage error types.

use bench_core::BenchError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// SQL execution error.
    #[error("SQL execution error: {0}")]
    Execution(String),

    /// A stored value could not be converted back into a domain type.
    #[error("Corrupt row in {table}: {message}")]
    Decode {
        /// Table the row came from.
        table: &'static str,
        /// What was wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pool error.
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Timeout error.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl StorageError {
    /// Create a decode error.
    pub fn decode(table: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            table,
            message: message.into(),
        }
    }

    /// Whether the database itself looks unreachable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Pool(_) | Self::Timeout(_)
        )
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => Self::Config(e.to_string()),
            sqlx::Error::Database(e) => Self::Execution(e.to_string()),
            sqlx::Error::Io(e) => Self::Connection(e.to_string()),
            sqlx::Error::Tls(e) => Self::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => Self::Timeout("Connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => Self::Pool("Connection pool is closed".to_string()),
            sqlx::Error::ColumnNotFound(column) => {
                Self::Execution(format!("column not found: {column}"))
            }
            _ => Self::Execution(err.to_string()),
        }
    }
}

impl From<StorageError> for BenchError {
    fn from(err: StorageError) -> Self {
        if err.is_unavailable() {
            Self::unavailable(err.to_string())
        } else {
            Self::storage(err.to_string())
        }
    }
}
