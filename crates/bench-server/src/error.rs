//! API error responses.
//!
//! Every failure renders as
//!
//! ```json
//! {"error": {"message": "...", "type": "...", "code": "...", "details": [...]}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bench_core::{BenchError, FieldError};
use bench_storage::StorageError;
use serde::Serialize;
use tracing::error;

/// Error returned by handlers and extractors
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Human readable message
    pub message: String,
    /// Error category
    pub error_type: &'static str,
    /// Stable machine readable code
    pub code: &'static str,
    /// Field level details for validation failures
    pub details: Vec<FieldError>,
}

impl ApiError {
    /// Create a new error
    pub fn new(
        status: StatusCode,
        error_type: &'static str,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            error_type,
            code,
            details: Vec::new(),
        }
    }

    /// Attach field details
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = details;
        self
    }

    /// 400 for bodies that are not valid JSON
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            "invalid_json",
            message,
        )
    }

    /// 422 for well-formed input with invalid values
    pub fn unprocessable(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "validation_failed",
            message,
        )
        .with_details(details)
    }

    /// 404
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "not_found", message)
    }

    /// 503
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "database_unavailable",
            message,
        )
    }

    /// 500
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal_error",
            message,
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    error_type: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "no_details")]
    details: &'a [FieldError],
}

fn no_details(details: &&[FieldError]) -> bool {
    details.is_empty()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                message: &self.message,
                error_type: self.error_type,
                code: self.code,
                details: &self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<BenchError> for ApiError {
    fn from(err: BenchError) -> Self {
        match err {
            BenchError::Validation { message, details } => Self::unprocessable(message, details),
            BenchError::NotFound { .. } => Self::not_found(err.to_string()),
            BenchError::Unavailable(message) => {
                error!(error = %message, "Database unavailable");
                Self::service_unavailable("Database unavailable")
            }
            other => {
                error!(error = %other, "Request failed with internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        BenchError::from(err).into()
    }
}
