//! Shared application state.

use bench_runner::BenchmarkRunner;
use bench_storage::BenchmarkRepository;
use bench_telemetry::BenchMetrics;

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Executes benchmark runs
    pub runner: BenchmarkRunner,
    /// Metrics registry rendered by `/metrics`
    pub metrics: BenchMetrics,
}

impl AppState {
    /// Create state from a runner and the metrics it records into
    #[must_use]
    pub fn new(runner: BenchmarkRunner, metrics: BenchMetrics) -> Self {
        Self { runner, metrics }
    }

    /// Repository used by read and delete endpoints
    #[must_use]
    pub fn repository(&self) -> &BenchmarkRepository {
        self.runner.repository()
    }
}
