//! Response payloads returned by the HTTP API.

use crate::job::{BenchmarkJob, BenchmarkStatus, JobSummary, PromptResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single result within a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResultResponse {
    /// Result id
    pub id: i64,
    /// Prompt that was sent
    pub prompt: String,
    /// Response text, null on failure
    pub response: Option<String>,
    /// Time to first token (ms)
    pub ttft_ms: Option<f64>,
    /// Total request time (ms)
    pub latency_ms: f64,
    /// Output generation speed
    pub tokens_per_second: f64,
    /// Prompt tokens
    pub input_tokens: u32,
    /// Completion tokens
    pub output_tokens: u32,
    /// Estimated cost
    pub cost_usd: f64,
    /// Error text, null on success
    pub error: Option<String>,
}

impl From<PromptResult> for BenchmarkResultResponse {
    fn from(result: PromptResult) -> Self {
        let data = result.data;
        Self {
            id: result.id,
            prompt: data.prompt,
            response: data.response,
            ttft_ms: data.ttft_ms,
            latency_ms: data.latency_ms,
            tokens_per_second: data.tokens_per_second,
            input_tokens: data.input_tokens,
            output_tokens: data.output_tokens,
            cost_usd: data.cost_usd,
            error: data.error,
        }
    }
}

/// Full benchmark with nested results (`GET /benchmarks/{id}`, `POST /benchmarks`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResponse {
    /// Benchmark id
    pub id: i64,
    /// Benchmark name
    pub name: String,
    /// Target model
    pub model: String,
    /// Current status
    pub status: BenchmarkStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Fan-out start time
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time
    pub completed_at: Option<DateTime<Utc>>,
    /// Results in submission order
    #[serde(default)]
    pub results: Vec<BenchmarkResultResponse>,
}

impl From<BenchmarkJob> for BenchmarkResponse {
    fn from(job: BenchmarkJob) -> Self {
        Self {
            id: job.id,
            name: job.name,
            model: job.model,
            status: job.status,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            results: job.results.into_iter().map(Into::into).collect(),
        }
    }
}

/// Listing entry for `GET /benchmarks`; carries a count instead of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Benchmark id
    pub id: i64,
    /// Benchmark name
    pub name: String,
    /// Target model
    pub model: String,
    /// Current status
    pub status: BenchmarkStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Number of stored results
    pub result_count: i64,
}

impl From<JobSummary> for BenchmarkSummary {
    fn from(summary: JobSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            model: summary.model,
            status: summary.status,
            created_at: summary.created_at,
            result_count: summary.result_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::NewPromptResult;

    #[test]
    fn test_failed_result_serializes_null_response() {
        let result = PromptResult {
            id: 7,
            benchmark_id: 1,
            data: NewPromptResult {
                prompt: "b".into(),
                latency_ms: 12.5,
                error: Some("connection refused".into()),
                ..NewPromptResult::default()
            },
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(BenchmarkResultResponse::from(result)).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json["response"].is_null());
        assert!(json["ttft_ms"].is_null());
        assert_eq!(json["error"], "connection refused");
    }

    #[test]
    fn test_job_response_field_names() {
        let job = BenchmarkJob {
            id: 3,
            name: "speed".into(),
            model: "claude-3-haiku-20240307".into(),
            status: BenchmarkStatus::Completed,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
            results: Vec::new(),
        };

        let json = serde_json::to_value(BenchmarkResponse::from(job)).unwrap();
        for key in [
            "id",
            "name",
            "model",
            "status",
            "created_at",
            "started_at",
            "completed_at",
            "results",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["status"], "completed");
    }
}
