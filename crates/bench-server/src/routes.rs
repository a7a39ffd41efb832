//! Route definitions.

use axum::{routing::get, Router};

use crate::{handlers, middleware, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(benchmark_routes());

    middleware::apply(router).with_state(state)
}

/// `/benchmarks` resource
fn benchmark_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/benchmarks",
            get(handlers::list_benchmarks).post(handlers::create_benchmark),
        )
        .route(
            "/benchmarks/:benchmark_id",
            get(handlers::get_benchmark).delete(handlers::delete_benchmark),
        )
}
