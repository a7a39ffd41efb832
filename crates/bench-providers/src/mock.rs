//! Scripted in-process provider for tests.
//!
//! Replies are keyed by prompt text. Steps run in order when the returned
//! stream is polled, so `tokio::time::pause` makes timings exact.

#![allow(clippy::panic)]

use crate::error::ProviderError;
use crate::provider::{EventStream, LlmProvider, MessageRequest, StreamEvent, TokenUsage};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted stream step
#[derive(Debug, Clone)]
pub enum Step {
    /// Wait on the tokio clock
    Sleep(Duration),
    /// Emit a text delta
    Text(String),
    /// Emit a usage event
    Usage(TokenUsage),
    /// Emit the stop event
    Stop,
    /// Emit an error item
    Fail(ProviderError),
    /// Panic inside the stream
    Panic(String),
}

/// Scripted reply for one prompt
#[derive(Debug, Clone)]
pub enum Reply {
    /// Accept the request and play the steps
    Stream(Vec<Step>),
    /// Refuse the request after a delay
    Reject {
        /// Delay before refusing
        after: Duration,
        /// Error returned from `stream_message`
        error: ProviderError,
    },
}

impl Reply {
    /// Play `steps`
    #[must_use]
    pub fn stream(steps: Vec<Step>) -> Self {
        Self::Stream(steps)
    }

    /// A complete answer: text after `ttft`, stop after a further `generation`.
    #[must_use]
    pub fn text(
        text: impl Into<String>,
        ttft: Duration,
        generation: Duration,
        input_tokens: u32,
        output_tokens: u32,
    ) -> Self {
        Self::Stream(vec![
            Step::Usage(TokenUsage {
                input_tokens: Some(input_tokens),
                output_tokens: Some(1),
            }),
            Step::Sleep(ttft),
            Step::Text(text.into()),
            Step::Sleep(generation),
            Step::Usage(TokenUsage {
                input_tokens: None,
                output_tokens: Some(output_tokens),
            }),
            Step::Stop,
        ])
    }

    /// Refuse immediately
    #[must_use]
    pub fn reject(error: ProviderError) -> Self {
        Self::reject_after(Duration::ZERO, error)
    }

    /// Refuse after `after`
    #[must_use]
    pub fn reject_after(after: Duration, error: ProviderError) -> Self {
        Self::Reject { after, error }
    }
}

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight(Arc<Counters>);

impl InFlight {
    fn enter(counters: &Arc<Counters>) -> Self {
        counters.calls.fetch_add(1, Ordering::SeqCst);
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(counters))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Provider that replays scripted replies
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: HashMap<String, Reply>,
    counters: Arc<Counters>,
    requests: Mutex<Vec<MessageRequest>>,
}

impl ScriptedProvider {
    /// Create a provider with no replies; unknown prompts get HTTP 404
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for `prompt`
    #[must_use]
    pub fn on(mut self, prompt: impl Into<String>, reply: Reply) -> Self {
        self.replies.insert(prompt.into(), reply);
        self
    }

    /// Number of requests made
    #[must_use]
    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open requests
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<MessageRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_message(&self, request: &MessageRequest) -> Result<EventStream, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let guard = InFlight::enter(&self.counters);

        let steps = match self.replies.get(&request.prompt) {
            Some(Reply::Stream(steps)) => steps.clone(),
            Some(Reply::Reject { after, error }) => {
                tokio::time::sleep(*after).await;
                return Err(error.clone());
            }
            None => {
                return Err(ProviderError::api(
                    404,
                    format!("no scripted reply for {:?}", request.prompt),
                ))
            }
        };

        let stream = stream! {
            let _guard = guard;
            for step in steps {
                match step {
                    Step::Sleep(duration) => tokio::time::sleep(duration).await,
                    Step::Text(text) => yield Ok(StreamEvent::TextDelta(text)),
                    Step::Usage(usage) => yield Ok(StreamEvent::Usage(usage)),
                    Step::Stop => yield Ok(StreamEvent::Stop),
                    Step::Fail(error) => yield Err(error),
                    Step::Panic(message) => panic!("{message}"),
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
