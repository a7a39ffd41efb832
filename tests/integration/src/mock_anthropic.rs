//! Mock Anthropic Messages API for integration testing
//!
//! Replies are matched on the prompt text so that one server can answer a
//! whole benchmark with a mix of successes and failures.

use crate::helpers::TEST_API_KEY;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Anthropic API server
pub struct MockAnthropic {
    /// Underlying wiremock server
    pub server: MockServer,
}

impl MockAnthropic {
    /// Start a mock server with no replies mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to point the provider at
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Number of requests received so far
    pub async fn calls(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Stream `text` back for `prompt`, split into two deltas
    pub async fn mock_stream(&self, prompt: &str, text: &str, input_tokens: u32, output_tokens: u32) {
        self.mock_stream_delayed(prompt, text, input_tokens, output_tokens, Duration::ZERO)
            .await;
    }

    /// Like [`Self::mock_stream`], but the response headers arrive after `delay`
    pub async fn mock_stream_delayed(
        &self,
        prompt: &str,
        text: &str,
        input_tokens: u32,
        output_tokens: u32,
        delay: Duration,
    ) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", TEST_API_KEY))
            .and(body_partial_json(prompt_matcher(prompt)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(message_stream(text, input_tokens, output_tokens))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Reply to `prompt` with an Anthropic error envelope
    pub async fn mock_error(&self, prompt: &str, status: u16, error_type: &str, message: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(prompt_matcher(prompt)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "type": "error",
                "error": {"type": error_type, "message": message}
            })))
            .mount(&self.server)
            .await;
    }

    /// Start a stream for `prompt` and then report an error event mid-way
    pub async fn mock_stream_error(&self, prompt: &str) {
        let body = sse(&[
            (
                "message_start",
                json!({"type": "message_start", "message": {"usage": {"input_tokens": 5, "output_tokens": 1}}}),
            ),
            ("content_block_delta", text_delta("partial")),
            (
                "error",
                json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
            ),
        ]);

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(prompt_matcher(prompt)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&self.server)
            .await;
    }
}

fn prompt_matcher(prompt: &str) -> Value {
    json!({"messages": [{"role": "user", "content": prompt}]})
}

fn text_delta(text: &str) -> Value {
    json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": text}})
}

/// Render named events as a `text/event-stream` body
pub fn sse(events: &[(&str, Value)]) -> String {
    events
        .iter()
        .map(|(name, data)| format!("event: {name}\ndata: {data}\n\n"))
        .collect()
}

/// A complete successful message stream
pub fn message_stream(text: &str, input_tokens: u32, output_tokens: u32) -> String {
    let split = text.char_indices().nth(text.chars().count() / 2).map_or(text.len(), |(i, _)| i);
    let (head, tail) = text.split_at(split);

    sse(&[
        (
            "message_start",
            json!({"type": "message_start", "message": {"usage": {"input_tokens": input_tokens, "output_tokens": 1}}}),
        ),
        (
            "content_block_start",
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        ),
        ("ping", json!({"type": "ping"})),
        ("content_block_delta", text_delta(head)),
        ("content_block_delta", text_delta(tail)),
        ("content_block_stop", json!({"type": "content_block_stop", "index": 0})),
        (
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": output_tokens}}),
        ),
        ("message_stop", json!({"type": "message_stop"})),
    ])
}
