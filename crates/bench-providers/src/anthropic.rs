//! Anthropic Messages API provider.
//!
//! Streams `POST {base_url}/v1/messages` with `stream: true` and translates the
//! Server-Sent Events into [`StreamEvent`]s:
//!
//! | SSE event             | Translation                         |
//! |-----------------------|-------------------------------------|
//! | `message_start`       | usage with input tokens             |
//! | `content_block_delta` | text delta (`text_delta` only)      |
//! | `message_delta`       | usage with cumulative output tokens |
//! | `message_stop`        | stop                                |
//! | `error`               | stream error                        |
//! | anything else         | ignored                             |

use crate::error::ProviderError;
use crate::provider::{EventStream, LlmProvider, MessageRequest, StreamEvent, TokenUsage};
use crate::sse::{SseDecoder, SseEvent};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic provider configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: SecretString,
    /// Base URL without trailing slash
    pub base_url: String,
    /// Value of the `anthropic-version` header
    pub api_version: String,
}

impl AnthropicConfig {
    /// Create a configuration for the public API
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: API_VERSION.to_string(),
        }
    }

    /// Point at a different base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// Anthropic streaming provider
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Create a new provider.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            warn!("Anthropic API key is empty; provider calls will be rejected");
        }

        let client = Client::builder()
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Translate one SSE event. `Ok(None)` means the event carries nothing we track.
    fn translate(event: &SseEvent) -> Result<Option<StreamEvent>, ProviderError> {
        let parsed: AnthropicEvent = serde_json::from_str(&event.data).map_err(|e| {
            ProviderError::Protocol(format!(
                "Invalid {} event payload: {e}",
                event.event.as_deref().unwrap_or("unnamed")
            ))
        })?;

        let translated = match parsed {
            AnthropicEvent::MessageStart { message } => {
                message.usage.map(|u| StreamEvent::Usage(u.into()))
            }
            AnthropicEvent::ContentBlockDelta {
                delta: AnthropicDelta::TextDelta { text },
            } => Some(StreamEvent::TextDelta(text)),
            AnthropicEvent::MessageDelta { usage } => usage.map(|u| StreamEvent::Usage(u.into())),
            AnthropicEvent::MessageStop {} => Some(StreamEvent::Stop),
            AnthropicEvent::Error { error } => {
                return Err(ProviderError::Event {
                    error_type: error.error_type,
                    message: error.message,
                })
            }
            AnthropicEvent::ContentBlockDelta { .. }
            | AnthropicEvent::ContentBlockStart {}
            | AnthropicEvent::ContentBlockStop {}
            | AnthropicEvent::Ping {}
            | AnthropicEvent::Unknown => None,
        };

        Ok(translated)
    }

    /// Parse a non-success response body
    fn parse_error(status: u16, body: &str) -> ProviderError {
        match serde_json::from_str::<AnthropicErrorResponse>(body) {
            Ok(response) => ProviderError::api(
                status,
                format!("{}: {}", response.error.error_type, response.error.message),
            ),
            Err(_) if body.trim().is_empty() => ProviderError::api(status, "empty response body"),
            Err(_) => ProviderError::api(status, body.trim()),
        }
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn stream_message(&self, request: &MessageRequest) -> Result<EventStream, ProviderError> {
        let url = self.config.messages_url();
        let body = AnthropicRequest::from(request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            url = %url,
            "Sending streaming message request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret().as_str())
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Anthropic streaming request failed");
                ProviderError::Http(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &body));
        }

        let stream = try_stream! {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = chunk_result.map_err(|e| ProviderError::Stream(e.to_string()))?;

                for event in decoder.push(&chunk) {
                    trace!(event = ?event.event, "Received SSE event");
                    if let Some(translated) = Self::translate(&event)? {
                        yield translated;
                    }
                }
            }

            if let Some(event) = decoder.finish() {
                if let Some(translated) = Self::translate(&event)? {
                    yield translated;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [AnthropicMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a MessageRequest> for AnthropicRequest<'a> {
    fn from(request: &'a MessageRequest) -> Self {
        Self {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: [AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    MessageStart { message: AnthropicMessageStart },
    ContentBlockStart {},
    ContentBlockDelta { delta: AnthropicDelta },
    ContentBlockStop {},
    MessageDelta {
        #[serde(default)]
        usage: Option<AnthropicUsage>,
    },
    MessageStop {},
    Ping {},
    Error { error: AnthropicErrorDetail },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageStart {
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: Option<u32>,
    #[serde(default)]
    output_tokens: Option<u32>,
}

impl From<AnthropicUsage> for TokenUsage {
    fn from(usage: AnthropicUsage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
