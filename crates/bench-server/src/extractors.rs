//! Custom Axum extractors.
//!
//! Each one converts axum's plain-text rejections into the JSON error envelope.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use bench_core::FieldError;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::debug;

use crate::error::ApiError;
use crate::middleware::REQUEST_ID_HEADER;

/// JSON body extractor.
///
/// Syntax errors are 400; well-formed JSON of the wrong shape is 422.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;

        let value: T = serde_json::from_slice(&bytes).map_err(|e| {
            debug!(error = %e, "JSON body rejected");
            match e.classify() {
                Category::Data => ApiError::unprocessable(
                    "Request body has the wrong shape",
                    vec![FieldError::new("body", e.to_string())],
                ),
                Category::Syntax | Category::Eof | Category::Io => {
                    ApiError::bad_request(format!("Invalid JSON: {e}"))
                }
            }
        })?;

        Ok(Self(value))
    }
}

/// Query string extractor that rejects bad values with 422.
#[derive(Debug, Clone, Copy)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::unprocessable(
                    "Invalid query parameters",
                    vec![FieldError::new("query", e.body_text())],
                )
            })?;
        Ok(Self(value))
    }
}

/// Numeric benchmark id from the path.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for BenchmarkId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::unprocessable(
                    "Invalid benchmark id",
                    vec![FieldError::new("benchmark_id", e.body_text())],
                )
            })?;
        Ok(Self(id))
    }
}

/// Request id assigned by the request id layer, or a fresh one.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

        Ok(Self(id))
    }
}
