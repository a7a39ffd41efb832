//! Benchmark fan-out.

use bench_core::{
    is_known_model, BenchError, BenchResult, BenchmarkJob, BenchmarkStatus,
    CreateBenchmarkRequest, NewPromptResult,
};
use bench_providers::{call_streaming, LlmCallOutcome, LlmProvider};
use bench_storage::{BenchmarkRepository, RunRecord};
use bench_telemetry::{BenchMetrics, CallOutcome};
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn, Instrument};

/// Default output token budget per call
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Runs benchmark jobs against a provider.
#[derive(Clone)]
pub struct BenchmarkRunner {
    provider: Arc<dyn LlmProvider>,
    repository: BenchmarkRepository,
    metrics: BenchMetrics,
    max_tokens: u32,
}

impl BenchmarkRunner {
    /// Create a runner
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        repository: BenchmarkRepository,
        metrics: BenchMetrics,
    ) -> Self {
        Self {
            provider,
            repository,
            metrics,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the output token budget per call
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Repository the runner writes to
    #[must_use]
    pub fn repository(&self) -> &BenchmarkRepository {
        &self.repository
    }

    /// Validate a request, create its job and run it to completion.
    ///
    /// Nothing is written when validation fails. Once validated, the insert,
    /// the fan-out and the final write run on a detached task, so dropping
    /// the returned future (a disconnected client) never strands the job.
    pub async fn execute(&self, request: CreateBenchmarkRequest) -> BenchResult<BenchmarkJob> {
        let request = request.validated()?;

        if !is_known_model(&request.model) {
            warn!(model = %request.model, "Unknown model, cost uses default pricing");
        }

        let runner = self.clone();
        let task = async move {
            let job = runner
                .repository
                .insert_job(&request.name, &request.model)
                .await
                .map_err(BenchError::from)?;
            runner.fan_out(job, request.prompts).await
        };
        detach(task.in_current_span()).await
    }

    /// Run every prompt of `job` concurrently and persist the outcome.
    ///
    /// All calls are in flight at once and the database is not touched until
    /// the last one settles. Returns the job as re-read from storage. The work
    /// continues to completion even if this future is dropped.
    pub async fn run(&self, job: BenchmarkJob, prompts: Vec<String>) -> BenchResult<BenchmarkJob> {
        let runner = self.clone();
        detach(async move { runner.fan_out(job, prompts).await }.in_current_span()).await
    }

    #[instrument(skip(self, job, prompts), fields(job_id = job.id, model = %job.model, prompts = prompts.len()))]
    async fn fan_out(&self, mut job: BenchmarkJob, prompts: Vec<String>) -> BenchResult<BenchmarkJob> {
        let started_at = Utc::now();
        job.start(started_at);
        info!("Benchmark run started");

        let handles: Vec<_> = prompts
            .iter()
            .map(|prompt| {
                let provider = Arc::clone(&self.provider);
                let prompt = prompt.clone();
                let model = job.model.clone();
                let max_tokens = self.max_tokens;
                tokio::spawn(async move {
                    call_streaming(provider.as_ref(), &prompt, &model, max_tokens).await
                })
            })
            .collect();

        let settled = join_all(handles).await;

        let results: Vec<NewPromptResult> = prompts
            .into_iter()
            .zip(settled)
            .map(|(prompt, joined)| self.settle(&job.model, prompt, joined))
            .collect();

        let errored = results.iter().filter(|r| r.is_error()).count();
        let status = BenchmarkStatus::from_outcomes(results.len(), errored);
        let completed_at = Utc::now();
        job.finish(status, completed_at);

        self.repository
            .record_run(&RunRecord {
                job_id: job.id,
                started_at,
                completed_at,
                status,
                results,
            })
            .await?;

        self.metrics.record_run(status.as_str());
        info!(
            status = %status,
            errored,
            elapsed_ms = (completed_at - started_at).num_milliseconds(),
            "Benchmark run finished"
        );

        self.repository
            .get_job(job.id)
            .await?
            .ok_or_else(|| BenchError::benchmark_not_found(job.id))
    }

    fn settle(
        &self,
        model: &str,
        prompt: String,
        joined: Result<LlmCallOutcome, JoinError>,
    ) -> NewPromptResult {
        match joined {
            Ok(outcome) => {
                let call = if outcome.is_error() {
                    CallOutcome::Error
                } else {
                    self.metrics.record_usage(
                        model,
                        outcome.input_tokens,
                        outcome.output_tokens,
                        outcome.cost_usd,
                    );
                    CallOutcome::Success
                };
                self.metrics
                    .record_call(model, call, outcome.latency(), outcome.ttft());

                info!(
                    latency_ms = outcome.latency_ms,
                    ttft_ms = ?outcome.ttft_ms,
                    output_tokens = outcome.output_tokens,
                    error = ?outcome.error,
                    "Prompt settled"
                );
                outcome.into_prompt_result(prompt)
            }
            Err(e) => {
                warn!(error = %e, "Prompt task did not complete");
                self.metrics.record_call(
                    model,
                    CallOutcome::TaskFailed,
                    std::time::Duration::ZERO,
                    None,
                );
                NewPromptResult::task_failed(e.to_string())
            }
        }
    }
}

/// Spawn `task` and wait for it; the task keeps running if the caller goes away.
async fn detach<F>(task: F) -> BenchResult<BenchmarkJob>
where
    F: Future<Output = BenchResult<BenchmarkJob>> + Send + 'static,
{
    tokio::spawn(task).await.map_err(|e| {
        error!(error = %e, "Benchmark task did not complete");
        BenchError::internal(format!("Benchmark task failed: {e}"))
    })?
}

impl std::fmt::Debug for BenchmarkRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkRunner")
            .field("provider", &self.provider.name())
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}
