//! Error types shared across the benchmark workspace.

use serde::Serialize;

/// Result alias using [`BenchError`].
pub type BenchResult<T> = Result<T, BenchError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field path (e.g. `prompts`, `name`)
    pub field: String,
    /// Human readable description
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top-level error for benchmark operations.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Request payload failed validation
    #[error("Validation failed: {message}")]
    Validation {
        /// Summary message
        message: String,
        /// Per-field details
        details: Vec<FieldError>,
    },

    /// Requested resource does not exist
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Resource kind, e.g. "Benchmark"
        resource: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// The database could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BenchError {
    /// Create a validation error with field details
    #[must_use]
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    /// Create a not-found error for a benchmark id
    #[must_use]
    pub fn benchmark_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "Benchmark",
            id,
        }
    }

    /// Create a storage error
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an unavailable error
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status code this error maps to
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 422,
            Self::NotFound { .. } => 404,
            Self::Unavailable(_) => 503,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable error type string for API responses
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Unavailable(_) => "service_unavailable",
            Self::Storage(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the error was caused by the client
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<validator::ValidationErrors> for BenchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        Self::validation("Request validation failed", details)
    }
}
