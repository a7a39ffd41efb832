//! Request payloads accepted by the HTTP API.

use crate::error::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Body of `POST /benchmarks`.
///
/// ```json
/// {
///     "name": "Claude speed test",
///     "model": "claude-3-5-sonnet-20241022",
///     "prompts": ["Hello, how are you?", "Explain quantum computing"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateBenchmarkRequest {
    /// Descriptive name for the benchmark
    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: String,

    /// Model to benchmark
    #[serde(default = "default_model")]
    pub model: String,

    /// Prompts to send, one provider call each
    #[validate(length(min = 1, message = "at least one prompt is required"))]
    pub prompts: Vec<String>,
}

impl CreateBenchmarkRequest {
    /// Create a request for the default model
    #[must_use]
    pub fn new(name: impl Into<String>, prompts: Vec<String>) -> Self {
        Self {
            name: name.into(),
            model: default_model(),
            prompts,
        }
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Run field validation, converting failures into [`BenchError::Validation`].
    pub fn validated(self) -> BenchResult<Self> {
        self.validate().map_err(BenchError::from)?;
        Ok(self)
    }
}

/// Pagination for `GET /benchmarks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Rows to skip
    #[serde(default)]
    pub skip: u32,
    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}
