//! HTTP request handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bench_core::{
    BenchError, BenchmarkResponse, BenchmarkSummary, CreateBenchmarkRequest, ListParams,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    extractors::{BenchmarkId, JsonBody, RequestId, ValidQuery},
    state::AppState,
};

/// Root response
#[derive(Debug, Serialize)]
pub struct RootResponse {
    /// Always "ok"
    pub status: &'static str,
    /// Greeting
    pub message: &'static str,
}

/// Liveness endpoint
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        message: "LLM Benchmark API is running",
    })
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: &'static str,
    /// "connected" or "disconnected"
    pub database: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Health check endpoint; pings the database
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.repository().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "disconnected",
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        }
    }
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.gather(),
    )
}

/// Create a benchmark and run it to completion.
///
/// The request stays open until every prompt has settled.
#[instrument(skip(state, body), fields(name = %body.name, model = %body.model, prompts = body.prompts.len()))]
pub async fn create_benchmark(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    JsonBody(body): JsonBody<CreateBenchmarkRequest>,
) -> Result<(StatusCode, Json<BenchmarkResponse>), ApiError> {
    info!(request_id = %request_id, "Creating benchmark");

    let job = state.runner.execute(body).await?;

    Ok((StatusCode::CREATED, Json(job.into())))
}

/// List benchmarks ordered by id
#[instrument(skip(state))]
pub async fn list_benchmarks(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Vec<BenchmarkSummary>>, ApiError> {
    let jobs = state
        .repository()
        .list_jobs(params.skip, params.limit)
        .await?;

    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

/// Get one benchmark with all its results
#[instrument(skip(state))]
pub async fn get_benchmark(
    State(state): State<AppState>,
    BenchmarkId(id): BenchmarkId,
) -> Result<Json<BenchmarkResponse>, ApiError> {
    let job = state
        .repository()
        .get_job(id)
        .await?
        .ok_or_else(|| BenchError::benchmark_not_found(id))?;

    Ok(Json(job.into()))
}

/// Delete a benchmark and its results
#[instrument(skip(state))]
pub async fn delete_benchmark(
    State(state): State<AppState>,
    BenchmarkId(id): BenchmarkId,
) -> Result<StatusCode, ApiError> {
    if state.repository().delete_job(id).await? {
        info!(benchmark_id = id, "Deleted benchmark");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BenchError::benchmark_not_found(id).into())
    }
}
