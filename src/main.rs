//! # LLM Benchmark API
//!
//! HTTP service that sends batches of prompts to Anthropic's Messages API,
//! measures time to first token, total latency, throughput and estimated
//! cost for each, and stores the results in SQLite or PostgreSQL.
//!
//! ## Usage
//!
//! ```bash
//! # SQLite file in the working directory, listening on 0.0.0.0:8000
//! ANTHROPIC_API_KEY=sk-ant-... llm-benchmark-api
//!
//! # PostgreSQL, JSON logs
//! DATABASE_URL=postgres://bench@localhost/bench LOG_FORMAT=json llm-benchmark-api
//! ```

use anyhow::Context;
use bench_config::{BenchConfig, LogFormat};
use bench_providers::{AnthropicConfig, AnthropicProvider};
use bench_runner::BenchmarkRunner;
use bench_server::{AppState, Server, ServerConfig};
use bench_storage::{create_schema, BenchmarkRepository, DatabasePool, PoolConfig};
use bench_telemetry::{init_logging, BenchMetrics, LoggingConfig};
use std::sync::Arc;
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    let config = match BenchConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let logging = LoggingConfig::new()
        .with_level(&config.logging.level)
        .with_json(config.logging.format == LogFormat::Json);
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting LLM Benchmark API"
    );

    if let Err(e) = run(config).await {
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

async fn run(config: BenchConfig) -> anyhow::Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        provider = ?config.provider,
        "Configuration loaded"
    );

    let pool_config = PoolConfig::builder()
        .max_connections(config.database.max_connections)
        .build();
    let pool = DatabasePool::connect(&config.database.url, &pool_config)
        .await
        .context("connecting to database")?;
    create_schema(&pool).await.context("creating schema")?;

    let provider = AnthropicProvider::new(
        AnthropicConfig::new(config.provider.api_key.clone())
            .with_base_url(&config.provider.base_url),
    )
    .context("building Anthropic client")?;

    let metrics = BenchMetrics::new().context("registering metrics")?;
    let runner = BenchmarkRunner::new(
        Arc::new(provider),
        BenchmarkRepository::new(pool.clone()),
        metrics.clone(),
    )
    .with_max_tokens(config.provider.max_tokens);

    let server_config = ServerConfig::new()
        .with_host(&config.server.host)
        .with_port(config.server.port);

    Server::new(server_config, AppState::new(runner, metrics))
        .run()
        .await
        .context("serving HTTP")?;

    pool.close().await;
    info!("Database pool closed");
    Ok(())
}
