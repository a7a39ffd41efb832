//! Table definitions.
//!
//! Timestamps are RFC 3339 text in both dialects so rows decode the same way
//! through the `Any` driver.

use crate::config::DatabaseType;
use crate::error::Result;
use crate::pool::DatabasePool;
use tracing::info;

const SQLITE_SCHEMA: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS benchmarks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        model TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS benchmark_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        benchmark_id INTEGER NOT NULL REFERENCES benchmarks(id) ON DELETE CASCADE,
        prompt TEXT NOT NULL,
        response TEXT,
        ttft_ms REAL,
        latency_ms REAL NOT NULL,
        tokens_per_second REAL NOT NULL,
        input_tokens INTEGER NOT NULL,
        output_tokens INTEGER NOT NULL,
        cost_usd REAL NOT NULL,
        error TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_benchmark_results_benchmark_id ON benchmark_results(benchmark_id)",
];

const POSTGRES_SCHEMA: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS benchmarks (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        model VARCHAR(255) NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS benchmark_results (
        id BIGSERIAL PRIMARY KEY,
        benchmark_id BIGINT NOT NULL REFERENCES benchmarks(id) ON DELETE CASCADE,
        prompt TEXT NOT NULL,
        response TEXT,
        ttft_ms DOUBLE PRECISION,
        latency_ms DOUBLE PRECISION NOT NULL,
        tokens_per_second DOUBLE PRECISION NOT NULL,
        input_tokens BIGINT NOT NULL,
        output_tokens BIGINT NOT NULL,
        cost_usd DOUBLE PRECISION NOT NULL,
        error TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_benchmark_results_benchmark_id ON benchmark_results(benchmark_id)",
];

fn statements(database_type: DatabaseType) -> &'static [&'static str] {
    match database_type {
        DatabaseType::SQLite => SQLITE_SCHEMA,
        DatabaseType::PostgreSQL => POSTGRES_SCHEMA,
    }
}

/// Create the tables if they do not exist yet.
pub async fn create_schema(pool: &DatabasePool) -> Result<()> {
    for statement in statements(pool.database_type()) {
        sqlx::query(statement).execute(pool.inner()).await?;
    }

    info!(database = %pool.database_type(), "Database schema ready");
    Ok(())
}
