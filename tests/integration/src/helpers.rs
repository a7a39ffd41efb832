//! Test helper utilities for integration tests

use bench_providers::{AnthropicConfig, AnthropicProvider};
use bench_runner::BenchmarkRunner;
use bench_server::{AppState, Server, ServerConfig};
use bench_storage::{create_schema, BenchmarkRepository, DatabasePool};
use bench_telemetry::BenchMetrics;
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// API key the mock Anthropic server expects
pub const TEST_API_KEY: &str = "sk-ant-integration";

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// A running service backed by in-memory SQLite
pub struct TestServer {
    /// The server address
    pub addr: SocketAddr,
    /// HTTP client for making requests
    pub client: Client,
    /// Base URL for the server
    pub base_url: String,
    /// Direct access to the database the server writes to
    pub repository: BenchmarkRepository,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server whose provider talks to `anthropic_url`
    pub async fn start(anthropic_url: &str) -> Self {
        init_tracing();

        let pool = DatabasePool::in_memory()
            .await
            .expect("Failed to open in-memory database");
        create_schema(&pool).await.expect("Failed to create schema");
        let repository = BenchmarkRepository::new(pool);

        let provider = AnthropicProvider::new(
            AnthropicConfig::new(SecretString::new(TEST_API_KEY.to_string()))
                .with_base_url(anthropic_url),
        )
        .expect("Failed to build provider");
        let metrics = BenchMetrics::new().expect("Failed to register metrics");
        let runner = BenchmarkRunner::new(Arc::new(provider), repository.clone(), metrics.clone())
            .with_max_tokens(256);
        let state = AppState::new(runner, metrics);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let server = Server::new(ServerConfig::new(), state);
        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create client");

        Self {
            addr,
            client,
            base_url: format!("http://{addr}"),
            repository,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a POST request with a JSON body
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Stop the server
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Read a response body as JSON
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("Response was not JSON")
}
