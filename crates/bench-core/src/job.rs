//! Benchmark job and prompt result domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prompt text stored for a result whose task died before reporting.
pub const TASK_FAILED_PROMPT: &str = "(unknown - task failed)";

/// Lifecycle status of a benchmark job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    /// Created, not yet started
    #[default]
    Pending,
    /// Prompts are in flight
    Running,
    /// At least one prompt produced a response
    Completed,
    /// Every prompt failed
    Failed,
}

impl BenchmarkStatus {
    /// Status string as stored and serialized
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the job has finished running
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Final status for a run given how many prompts were submitted and how
    /// many of their results carry an error.
    #[must_use]
    pub fn from_outcomes(submitted: usize, errored: usize) -> Self {
        if errored == submitted {
            Self::Failed
        } else {
            Self::Completed
        }
    }
}

impl fmt::Display for BenchmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenchmarkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown benchmark status: {other}")),
        }
    }
}

/// A benchmark job together with its results.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkJob {
    /// Database identifier
    pub id: i64,
    /// User supplied name
    pub name: String,
    /// Model every prompt is sent to
    pub model: String,
    /// Current status
    pub status: BenchmarkStatus,
    /// When the job was submitted
    pub created_at: DateTime<Utc>,
    /// When the fan-out started
    pub started_at: Option<DateTime<Utc>>,
    /// When all results were recorded
    pub completed_at: Option<DateTime<Utc>>,
    /// Results in insertion order
    pub results: Vec<PromptResult>,
}

impl BenchmarkJob {
    /// Mark the job as running, stamping the start time.
    pub fn start(&mut self, at: DateTime<Utc>) {
        self.status = BenchmarkStatus::Running;
        self.started_at = Some(at);
    }

    /// Mark the job as finished with the given status.
    pub fn finish(&mut self, status: BenchmarkStatus, at: DateTime<Utc>) {
        self.status = status;
        self.completed_at = Some(at);
    }

    /// Number of results carrying an error
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.data.is_error()).count()
    }
}

/// Lightweight job row used for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    /// Database identifier
    pub id: i64,
    /// User supplied name
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

/// A persisted per-prompt result.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    /// Database identifier
    pub id: i64,
    /// Owning job
    pub benchmark_id: i64,
    /// Measurements recorded for the prompt
    pub data: NewPromptResult,
    /// When the row was written
    pub created_at: DateTime<Utc>,
}

/// Measurements for a prompt result that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPromptResult {
    /// Prompt that was sent
    pub prompt: String,
    /// Response text, `None` on failure
    pub response: Option<String>,
    /// Time to first token in milliseconds
    pub ttft_ms: Option<f64>,
    /// Total latency in milliseconds
    pub latency_ms: f64,
    /// Output tokens per second during generation
    pub tokens_per_second: f64,
    /// Prompt tokens billed
    pub input_tokens: u32,
    /// Completion tokens billed
    pub output_tokens: u32,
    /// Estimated cost in USD
    pub cost_usd: f64,
    /// Error text, `None` on success
    pub error: Option<String>,
}

impl NewPromptResult {
    /// Placeholder for a task that failed before it could report anything.
    #[must_use]
    pub fn task_failed(error: impl Into<String>) -> Self {
        Self {
            prompt: TASK_FAILED_PROMPT.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether this result records a failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
