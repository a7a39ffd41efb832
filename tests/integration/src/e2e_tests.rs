//! End-to-end tests: HTTP in, streamed provider calls out, rows in SQLite.

use crate::helpers::{json_body, TestServer};
use crate::mock_anthropic::MockAnthropic;
use serde_json::json;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_mixed_outcomes_complete() {
    let anthropic = MockAnthropic::start().await;
    anthropic.mock_stream("Hello", "Hi there, friend", 8, 5).await;
    anthropic
        .mock_error("Break", 500, "api_error", "Internal server error")
        .await;
    anthropic
        .mock_stream("Explain recursion", "To understand recursion...", 12, 9)
        .await;
    let server = TestServer::start(&anthropic.url()).await;

    let response = server
        .post_json(
            "/benchmarks",
            &json!({
                "name": "mixed",
                "model": "claude-3-haiku-20240307",
                "prompts": ["Hello", "Break", "Explain recursion"]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = json_body(response).await;

    assert_eq!(body["status"], "completed");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    let prompts: Vec<&str> = results.iter().map(|r| r["prompt"].as_str().unwrap()).collect();
    assert_eq!(prompts, ["Hello", "Break", "Explain recursion"]);

    let hello = &results[0];
    assert_eq!(hello["response"], "Hi there, friend");
    assert_eq!(hello["input_tokens"], 8);
    assert_eq!(hello["output_tokens"], 5);
    assert!(hello["tokens_per_second"].as_f64().unwrap() > 0.0);
    assert!(hello["ttft_ms"].as_f64().unwrap() <= hello["latency_ms"].as_f64().unwrap());
    assert!(hello["cost_usd"].as_f64().unwrap() > 0.0);
    assert!(hello["error"].is_null());

    let broken = &results[1];
    assert!(broken["response"].is_null());
    assert!(broken["ttft_ms"].is_null());
    assert_eq!(broken["tokens_per_second"], 0.0);
    assert_eq!(broken["input_tokens"], 0);
    let error = broken["error"].as_str().unwrap();
    assert!(error.contains("500"), "unexpected error text: {error}");

    assert_eq!(anthropic.calls().await, 3);

    // The stored job matches what the POST returned.
    let id = body["id"].as_i64().unwrap();
    let fetched = json_body(server.get(&format!("/benchmarks/{id}")).await).await;
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_all_prompts_failing_marks_job_failed() {
    let anthropic = MockAnthropic::start().await;
    anthropic
        .mock_error("One", 429, "rate_limit_error", "Too many requests")
        .await;
    anthropic.mock_stream_error("Two").await;
    let server = TestServer::start(&anthropic.url()).await;

    let response = server
        .post_json("/benchmarks", &json!({"name": "doomed", "prompts": ["One", "Two"]}))
        .await;
    assert_eq!(response.status(), 201);
    let body = json_body(response).await;

    assert_eq!(body["status"], "failed");
    assert!(body["completed_at"].is_string());
    let results = body["results"].as_array().unwrap();
    assert!(results[0]["error"].as_str().unwrap().contains("rate_limit_error"));
    assert!(results[1]["error"].as_str().unwrap().contains("Overloaded"));
    assert!(results.iter().all(|r| r["response"].is_null()));
}

#[tokio::test]
async fn test_prompts_run_concurrently() {
    let anthropic = MockAnthropic::start().await;
    let prompts = ["a", "b", "c", "d"];
    for prompt in prompts {
        anthropic
            .mock_stream_delayed(prompt, "ok", 1, 1, Duration::from_millis(400))
            .await;
    }
    let server = TestServer::start(&anthropic.url()).await;

    let started = Instant::now();
    let response = server
        .post_json("/benchmarks", &json!({"name": "parallel", "prompts": prompts}))
        .await;
    let elapsed = started.elapsed();

    assert_eq!(response.status(), 201);
    assert_eq!(json_body(response).await["status"], "completed");
    assert!(
        elapsed < Duration::from_millis(1200),
        "four 400ms calls took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_empty_prompts_rejected_without_side_effects() {
    let anthropic = MockAnthropic::start().await;
    let server = TestServer::start(&anthropic.url()).await;

    let response = server
        .post_json("/benchmarks", &json!({"name": "nothing", "prompts": []}))
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(anthropic.calls().await, 0);
    assert!(server.repository.list_jobs(0, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_benchmark() {
    let anthropic = MockAnthropic::start().await;
    let server = TestServer::start(&anthropic.url()).await;

    let response = server.get("/benchmarks/999").await;
    assert_eq!(response.status(), 404);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "Benchmark with id 999 not found");

    assert_eq!(server.delete("/benchmarks/999").await.status(), 404);
}

#[tokio::test]
async fn test_delete_removes_job_and_results() {
    let anthropic = MockAnthropic::start().await;
    anthropic.mock_stream("Hello", "Hi", 3, 2).await;
    let server = TestServer::start(&anthropic.url()).await;

    let keep = json_body(
        server
            .post_json("/benchmarks", &json!({"name": "keep", "prompts": ["Hello"]}))
            .await,
    )
    .await;
    let dropped = json_body(
        server
            .post_json("/benchmarks", &json!({"name": "drop", "prompts": ["Hello", "Hello"]}))
            .await,
    )
    .await;
    let drop_id = dropped["id"].as_i64().unwrap();

    let response = server.delete(&format!("/benchmarks/{drop_id}")).await;
    assert_eq!(response.status(), 204);

    assert!(server.repository.get_job(drop_id).await.unwrap().is_none());
    let remaining = server.repository.list_jobs(0, 100).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep["id"].as_i64().unwrap());
    assert_eq!(remaining[0].result_count, 1);
}

#[tokio::test]
async fn test_client_disconnect_does_not_strand_job() {
    let anthropic = MockAnthropic::start().await;
    anthropic
        .mock_stream_delayed("Slow", "eventually", 4, 2, Duration::from_millis(300))
        .await;
    let server = TestServer::start(&anthropic.url()).await;

    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let outcome = impatient
        .post(server.url("/benchmarks"))
        .json(&json!({"name": "walked away", "prompts": ["Slow"]}))
        .send()
        .await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_millis(800)).await;

    let jobs = server.repository.list_jobs(0, 100).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status.as_str(), "completed");
    assert_eq!(jobs[0].result_count, 1);
    assert_eq!(anthropic.calls().await, 1);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let anthropic = MockAnthropic::start().await;
    anthropic.mock_stream("Hello", "Hi", 3, 2).await;
    let server = TestServer::start(&anthropic.url()).await;

    let health = server.get("/health").await;
    assert_eq!(health.status(), 200);
    assert_eq!(json_body(health).await["database"], "connected");

    server
        .post_json("/benchmarks", &json!({"name": "m", "prompts": ["Hello"]}))
        .await;

    let metrics = server.get("/metrics").await.text().await.unwrap();
    assert!(metrics.contains("benchmark_runs_total{status=\"completed\"} 1"));
    assert!(metrics.contains("benchmark_prompt_calls_total"));
}
