//! Prometheus metrics for benchmark runs.

use crate::logging::TelemetryError;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Outcome label for a single provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Provider returned a complete response
    Success,
    /// Provider or transport error recorded on the result
    Error,
    /// The task running the call did not report back
    TaskFailed,
}

impl CallOutcome {
    fn as_label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::TaskFailed => "task_failed",
        }
    }
}

/// Benchmark metrics registry
#[derive(Clone)]
pub struct BenchMetrics {
    registry: Registry,
    runs_total: IntCounterVec,
    prompt_calls_total: IntCounterVec,
    prompt_latency_seconds: HistogramVec,
    prompt_ttft_seconds: HistogramVec,
    tokens_total: IntCounterVec,
    cost_usd_total: CounterVec,
}

impl BenchMetrics {
    /// Create and register all metrics on a fresh registry.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let runs_total = IntCounterVec::new(
            Opts::new("benchmark_runs_total", "Benchmark runs by final status"),
            &["status"],
        )?;
        let prompt_calls_total = IntCounterVec::new(
            Opts::new("benchmark_prompt_calls_total", "Provider calls by model and outcome"),
            &["model", "outcome"],
        )?;
        let latency_buckets = vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];
        let prompt_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "benchmark_prompt_latency_seconds",
                "Total provider call latency",
            )
            .buckets(latency_buckets),
            &["model"],
        )?;
        let prompt_ttft_seconds = HistogramVec::new(
            HistogramOpts::new("benchmark_prompt_ttft_seconds", "Time to first token")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]),
            &["model"],
        )?;
        let tokens_total = IntCounterVec::new(
            Opts::new("benchmark_tokens_total", "Tokens consumed by direction"),
            &["model", "direction"],
        )?;
        let cost_usd_total = CounterVec::new(
            Opts::new("benchmark_cost_usd_total", "Estimated spend in USD"),
            &["model"],
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(prompt_calls_total.clone()))?;
        registry.register(Box::new(prompt_latency_seconds.clone()))?;
        registry.register(Box::new(prompt_ttft_seconds.clone()))?;
        registry.register(Box::new(tokens_total.clone()))?;
        registry.register(Box::new(cost_usd_total.clone()))?;

        Ok(Self {
            registry,
            runs_total,
            prompt_calls_total,
            prompt_latency_seconds,
            prompt_ttft_seconds,
            tokens_total,
            cost_usd_total,
        })
    }

    /// Count a finished run by its final status.
    pub fn record_run(&self, status: &str) {
        self.runs_total.with_label_values(&[status]).inc();
    }

    /// Record one provider call.
    pub fn record_call(
        &self,
        model: &str,
        outcome: CallOutcome,
        latency: Duration,
        ttft: Option<Duration>,
    ) {
        self.prompt_calls_total
            .with_label_values(&[model, outcome.as_label()])
            .inc();
        if outcome == CallOutcome::TaskFailed {
            return;
        }
        self.prompt_latency_seconds
            .with_label_values(&[model])
            .observe(latency.as_secs_f64());
        if let Some(ttft) = ttft {
            self.prompt_ttft_seconds
                .with_label_values(&[model])
                .observe(ttft.as_secs_f64());
        }
    }

    /// Record token usage and spend for one call.
    pub fn record_usage(&self, model: &str, input_tokens: u32, output_tokens: u32, cost_usd: f64) {
        self.tokens_total
            .with_label_values(&[model, "input"])
            .inc_by(u64::from(input_tokens));
        self.tokens_total
            .with_label_values(&[model, "output"])
            .inc_by(u64::from(output_tokens));
        if cost_usd > 0.0 {
            self.cost_usd_total.with_label_values(&[model]).inc_by(cost_usd);
        }
    }

    /// Render all metrics in the Prometheus text format.
    #[must_use]
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for BenchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchMetrics").finish_non_exhaustive()
    }
}
