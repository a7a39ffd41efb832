//! Benchmark job and result persistence.

use crate::error::{Result, StorageError};
use crate::pool::DatabasePool;
use bench_core::{BenchmarkJob, BenchmarkStatus, JobSummary, NewPromptResult, PromptResult};
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{Any, Row, Transaction};
use tracing::{debug, instrument};

/// Everything a finished run writes back.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Job the run belongs to
    pub job_id: i64,
    /// When the fan-out started
    pub started_at: DateTime<Utc>,
    /// When the last call settled
    pub completed_at: DateTime<Utc>,
    /// Final status
    pub status: BenchmarkStatus,
    /// One result per submitted prompt
    pub results: Vec<NewPromptResult>,
}

/// Repository for benchmark jobs and their results.
#[derive(Debug, Clone)]
pub struct BenchmarkRepository {
    pool: DatabasePool,
}

impl BenchmarkRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Insert a new job in `pending` state.
    #[instrument(skip(self))]
    pub async fn insert_job(&self, name: &str, model: &str) -> Result<BenchmarkJob> {
        let created_at = Utc::now();
        let row = sqlx::query(
            "INSERT INTO benchmarks (name, model, status, created_at) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(name)
        .bind(model)
        .bind(BenchmarkStatus::Pending.as_str())
        .bind(created_at.to_rfc3339())
        .fetch_one(self.pool.inner())
        .await?;

        let id: i64 = row.try_get("id")?;
        debug!(job_id = id, "Inserted benchmark job");

        Ok(BenchmarkJob {
            id,
            name: name.to_string(),
            model: model.to_string(),
            status: BenchmarkStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            results: Vec::new(),
        })
    }

    /// Record a finished run atomically.
    ///
    /// The `running` transition, every result and the final status commit
    /// together or not at all.
    #[instrument(skip(self, run), fields(job_id = run.job_id, results = run.results.len()))]
    pub async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let mut tx = self.pool.inner().begin().await?;

        update_status(
            &mut tx,
            run.job_id,
            BenchmarkStatus::Running,
            "started_at",
            run.started_at,
        )
        .await?;
        insert_results_in(&mut tx, run.job_id, &run.results).await?;
        update_status(
            &mut tx,
            run.job_id,
            run.status,
            "completed_at",
            run.completed_at,
        )
        .await?;

        tx.commit().await?;
        debug!(status = %run.status, "Recorded benchmark run");
        Ok(())
    }

    /// Append results to a job in one transaction.
    #[instrument(skip(self, results), fields(results = results.len()))]
    pub async fn insert_results(&self, job_id: i64, results: &[NewPromptResult]) -> Result<()> {
        let mut tx = self.pool.inner().begin().await?;
        insert_results_in(&mut tx, job_id, results).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Load a job with its results in insertion order.
    #[instrument(skip(self))]
    pub async fn get_job(&self, id: i64) -> Result<Option<BenchmarkJob>> {
        let row = sqlx::query(
            "SELECT id, name, model, status, created_at, started_at, completed_at FROM benchmarks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut job = job_from_row(&row)?;

        let rows = sqlx::query(
            r"SELECT id, benchmark_id, prompt, response, ttft_ms, latency_ms, tokens_per_second,
                     input_tokens, output_tokens, cost_usd, error, created_at
              FROM benchmark_results WHERE benchmark_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool.inner())
        .await?;

        job.results = rows.iter().map(result_from_row).collect::<Result<_>>()?;
        Ok(Some(job))
    }

    /// List jobs ordered by id with their result counts.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, skip: u32, limit: u32) -> Result<Vec<JobSummary>> {
        let rows = sqlx::query(
            r"SELECT b.id, b.name, b.model, b.status, b.created_at,
                     (SELECT COUNT(*) FROM benchmark_results r WHERE r.benchmark_id = b.id) AS result_count
              FROM benchmarks b ORDER BY b.id LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(limit))
        .bind(i64::from(skip))
        .fetch_all(self.pool.inner())
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Delete a job and its results. Returns whether the job existed.
    #[instrument(skip(self))]
    pub async fn delete_job(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query("DELETE FROM benchmark_results WHERE benchmark_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM benchmarks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Check the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

async fn update_status(
    tx: &mut Transaction<'_, Any>,
    job_id: i64,
    status: BenchmarkStatus,
    timestamp_column: &'static str,
    at: DateTime<Utc>,
) -> Result<()> {
    let sql = format!("UPDATE benchmarks SET status = $1, {timestamp_column} = $2 WHERE id = $3");
    let updated = sqlx::query(&sql)
        .bind(status.as_str())
        .bind(at.to_rfc3339())
        .bind(job_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(StorageError::Execution(format!(
            "benchmark {job_id} does not exist"
        )));
    }
    Ok(())
}

async fn insert_results_in(
    tx: &mut Transaction<'_, Any>,
    job_id: i64,
    results: &[NewPromptResult],
) -> Result<()> {
    let created_at = Utc::now().to_rfc3339();
    for result in results {
        sqlx::query(
            r"INSERT INTO benchmark_results
                (benchmark_id, prompt, response, ttft_ms, latency_ms, tokens_per_second,
                 input_tokens, output_tokens, cost_usd, error, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(job_id)
        .bind(&result.prompt)
        .bind(result.response.as_deref())
        .bind(result.ttft_ms)
        .bind(result.latency_ms)
        .bind(result.tokens_per_second)
        .bind(i64::from(result.input_tokens))
        .bind(i64::from(result.output_tokens))
        .bind(result.cost_usd)
        .bind(result.error.as_deref())
        .bind(&created_at)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn parse_status(value: &str) -> Result<BenchmarkStatus> {
    value
        .parse()
        .map_err(|e: String| StorageError::decode("benchmarks", e))
}

fn parse_timestamp(table: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::decode(table, format!("invalid timestamp {value:?}: {e}")))
}

fn parse_optional_timestamp(table: &'static str, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(table, &v)).transpose()
}

fn token_count(row: &AnyRow, column: &str) -> Result<u32> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| {
        StorageError::decode("benchmark_results", format!("{column} out of range: {value}"))
    })
}

fn job_from_row(row: &AnyRow) -> Result<BenchmarkJob> {
    Ok(BenchmarkJob {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        model: row.try_get("model")?,
        status: parse_status(&row.try_get::<String, _>("status")?)?,
        created_at: parse_timestamp("benchmarks", &row.try_get::<String, _>("created_at")?)?,
        started_at: parse_optional_timestamp("benchmarks", row.try_get("started_at")?)?,
        completed_at: parse_optional_timestamp("benchmarks", row.try_get("completed_at")?)?,
        results: Vec::new(),
    })
}

fn summary_from_row(row: &AnyRow) -> Result<JobSummary> {
    Ok(JobSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        model: row.try_get("model")?,
        status: parse_status(&row.try_get::<String, _>("status")?)?,
        created_at: parse_timestamp("benchmarks", &row.try_get::<String, _>("created_at")?)?,
        result_count: row.try_get("result_count")?,
    })
}

fn result_from_row(row: &AnyRow) -> Result<PromptResult> {
    Ok(PromptResult {
        id: row.try_get("id")?,
        benchmark_id: row.try_get("benchmark_id")?,
        data: NewPromptResult {
            prompt: row.try_get("prompt")?,
            response: row.try_get("response")?,
            ttft_ms: row.try_get("ttft_ms")?,
            latency_ms: row.try_get("latency_ms")?,
            tokens_per_second: row.try_get("tokens_per_second")?,
            input_tokens: token_count(row, "input_tokens")?,
            output_tokens: token_count(row, "output_tokens")?,
            cost_usd: row.try_get("cost_usd")?,
            error: row.try_get("error")?,
        },
        created_at: parse_timestamp("benchmark_results", &row.try_get::<String, _>("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_schema;

    async fn repository() -> BenchmarkRepository {
        let pool = DatabasePool::in_memory().await.unwrap();
        create_schema(&pool).await.unwrap();
        BenchmarkRepository::new(pool)
    }

    fn success(prompt: &str) -> NewPromptResult {
        NewPromptResult {
            prompt: prompt.to_string(),
            response: Some(format!("answer to {prompt}")),
            ttft_ms: Some(120.5),
            latency_ms: 950.25,
            tokens_per_second: 42.0,
            input_tokens: 11,
            output_tokens: 35,
            cost_usd: 0.000_046_5,
            error: None,
        }
    }

    fn failure(prompt: &str) -> NewPromptResult {
        NewPromptResult {
            prompt: prompt.to_string(),
            latency_ms: 15.0,
            error: Some("Request failed: connection refused".to_string()),
            ..NewPromptResult::default()
        }
    }

    fn run(job_id: i64, status: BenchmarkStatus, results: Vec<NewPromptResult>) -> RunRecord {
        let started_at = Utc::now();
        RunRecord {
            job_id,
            started_at,
            completed_at: started_at + chrono::Duration::milliseconds(900),
            status,
            results,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_job() {
        let repo = repository().await;
        let job = repo.insert_job("smoke", "claude-3-haiku-20240307").await.unwrap();

        assert_eq!(job.status, BenchmarkStatus::Pending);

        let loaded = repo.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "smoke");
        assert_eq!(loaded.model, "claude-3-haiku-20240307");
        assert_eq!(loaded.status, BenchmarkStatus::Pending);
        assert_eq!(loaded.started_at, None);
        assert_eq!(loaded.completed_at, None);
        assert!(loaded.results.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_job() {
        let repo = repository().await;
        assert!(repo.get_job(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_run() {
        let repo = repository().await;
        let job = repo.insert_job("mixed", "claude-3-haiku-20240307").await.unwrap();
        let record = run(
            job.id,
            BenchmarkStatus::Completed,
            vec![success("a"), failure("b"), success("c")],
        );

        repo.record_run(&record).await.unwrap();

        let loaded = repo.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BenchmarkStatus::Completed);
        assert!(loaded.started_at.is_some());
        assert!(loaded.completed_at.unwrap() >= loaded.started_at.unwrap());

        let prompts: Vec<&str> = loaded.results.iter().map(|r| r.data.prompt.as_str()).collect();
        assert_eq!(prompts, ["a", "b", "c"]);
        assert_eq!(loaded.results[0].data, success("a"));
        assert_eq!(loaded.results[1].data, failure("b"));
        assert!(loaded.results.iter().all(|r| r.benchmark_id == job.id));
    }

    #[tokio::test]
    async fn test_record_run_for_missing_job_rolls_back() {
        let repo = repository().await;
        let record = run(42, BenchmarkStatus::Completed, vec![success("orphan")]);

        assert!(repo.record_run(&record).await.is_err());

        let jobs = repo.list_jobs(0, 20).await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_insert_results() {
        let repo = repository().await;
        let job = repo.insert_job("append", "m").await.unwrap();

        repo.insert_results(job.id, &[success("x")]).await.unwrap();
        repo.insert_results(job.id, &[failure("y")]).await.unwrap();

        let loaded = repo.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.results.len(), 2);
        assert_eq!(loaded.error_count(), 1);
    }

    #[tokio::test]
    async fn test_list_jobs_pagination_and_counts() {
        let repo = repository().await;
        let mut ids = Vec::new();
        for i in 0..5 {
            let job = repo.insert_job(&format!("job-{i}"), "m").await.unwrap();
            ids.push(job.id);
        }
        repo.insert_results(ids[1], &[success("a"), success("b")]).await.unwrap();

        let all = repo.list_jobs(0, 20).await.unwrap();
        assert_eq!(all.iter().map(|j| j.id).collect::<Vec<_>>(), ids);
        assert_eq!(all[1].result_count, 2);
        assert_eq!(all[0].result_count, 0);

        let page = repo.list_jobs(1, 2).await.unwrap();
        assert_eq!(page.iter().map(|j| j.id).collect::<Vec<_>>(), ids[1..3]);

        assert!(repo.list_jobs(10, 20).await.unwrap().is_empty());
        assert!(repo.list_jobs(0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_job_removes_results() {
        let repo = repository().await;
        let job = repo.insert_job("doomed", "m").await.unwrap();
        let keep = repo.insert_job("kept", "m").await.unwrap();
        repo.record_run(&run(job.id, BenchmarkStatus::Completed, vec![success("a"), success("b")]))
            .await
            .unwrap();
        repo.insert_results(keep.id, &[success("c")]).await.unwrap();

        assert!(repo.delete_job(job.id).await.unwrap());
        assert!(repo.get_job(job.id).await.unwrap().is_none());
        assert!(!repo.delete_job(job.id).await.unwrap());

        let row = sqlx::query("SELECT COUNT(*) AS n FROM benchmark_results")
            .fetch_one(repo.pool().inner())
            .await
            .unwrap();
        let remaining: i64 = row.get("n");
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_ping() {
        let repo = repository().await;
        repo.ping().await.unwrap();
    }
}
