//! Provider trait and streaming event types.

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

/// Stream of decoded provider events.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ProviderError>>;

/// A single-turn message request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRequest {
    /// Target model
    pub model: String,
    /// User prompt
    pub prompt: String,
    /// Maximum output tokens
    pub max_tokens: u32,
}

impl MessageRequest {
    /// Create a request for one user prompt
    #[must_use]
    pub fn user(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// Token counts reported by the provider.
///
/// Either side may be absent in a given event; later values replace earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: Option<u32>,
    /// Completion tokens so far
    pub output_tokens: Option<u32>,
}

impl TokenUsage {
    /// Overlay the fields present in `other`.
    pub fn merge(&mut self, other: Self) {
        if other.input_tokens.is_some() {
            self.input_tokens = other.input_tokens;
        }
        if other.output_tokens.is_some() {
            self.output_tokens = other.output_tokens;
        }
    }
}

/// Event decoded from a provider stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk of generated text (may be empty)
    TextDelta(String),
    /// Usage summary
    Usage(TokenUsage),
    /// The provider finished the message
    Stop,
}

/// An LLM backend that can stream one completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Open a streaming request.
    ///
    /// Errors returned here happen before any event was received; errors
    /// after that arrive as items of the stream.
    async fn stream_message(&self, request: &MessageRequest) -> Result<EventStream, ProviderError>;
}
