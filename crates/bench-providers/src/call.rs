//! Single measured provider call.

use crate::error::ProviderError;
use crate::provider::{LlmProvider, MessageRequest, StreamEvent, TokenUsage};
use bench_core::{calculate_cost, calculate_tokens_per_second, NewPromptResult};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Measured result of one streaming call.
///
/// A failed call carries an empty response, no TTFT, the elapsed time as
/// latency, zeroed usage and the error text.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmCallOutcome {
    /// Concatenated response text
    pub response_text: String,
    /// Time to first non-empty text chunk, in milliseconds
    pub ttft_ms: Option<f64>,
    /// Total wall-clock time, in milliseconds
    pub latency_ms: f64,
    /// Output tokens per second of generation
    pub tokens_per_second: f64,
    /// Prompt tokens
    pub input_tokens: u32,
    /// Completion tokens
    pub output_tokens: u32,
    /// Estimated cost in USD
    pub cost_usd: f64,
    /// Error description when the call failed
    pub error: Option<String>,
}

impl LlmCallOutcome {
    fn failure(error: &ProviderError, elapsed: Duration) -> Self {
        Self {
            response_text: String::new(),
            ttft_ms: None,
            latency_ms: duration_ms(elapsed),
            tokens_per_second: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            error: Some(error.to_string()),
        }
    }

    /// Whether the call failed
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Total latency as a duration
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_secs_f64(self.latency_ms.max(0.0) / 1000.0)
    }

    /// Time to first token as a duration
    #[must_use]
    pub fn ttft(&self) -> Option<Duration> {
        self.ttft_ms
            .map(|ms| Duration::from_secs_f64(ms.max(0.0) / 1000.0))
    }

    /// Convert into a result row for `prompt`.
    ///
    /// Failed calls store no response text.
    #[must_use]
    pub fn into_prompt_result(self, prompt: impl Into<String>) -> NewPromptResult {
        let response = if self.error.is_some() {
            None
        } else {
            Some(self.response_text)
        };

        NewPromptResult {
            prompt: prompt.into(),
            response,
            ttft_ms: self.ttft_ms,
            latency_ms: self.latency_ms,
            tokens_per_second: self.tokens_per_second,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cost_usd: self.cost_usd,
            error: self.error,
        }
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

struct Collected {
    text: String,
    first_token: Option<Instant>,
    usage: TokenUsage,
}

async fn collect(
    provider: &dyn LlmProvider,
    request: &MessageRequest,
) -> Result<Collected, ProviderError> {
    let mut stream = provider.stream_message(request).await?;
    let mut collected = Collected {
        text: String::new(),
        first_token: None,
        usage: TokenUsage::default(),
    };

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::TextDelta(text) => {
                if collected.first_token.is_none() && !text.is_empty() {
                    collected.first_token = Some(Instant::now());
                }
                collected.text.push_str(&text);
            }
            StreamEvent::Usage(usage) => collected.usage.merge(usage),
            StreamEvent::Stop => return Ok(collected),
        }
    }

    Err(ProviderError::IncompleteStream)
}

/// Stream one prompt and measure it.
///
/// Never fails: connection, HTTP, stream and protocol errors are folded into
/// the returned outcome. Exactly one request is made.
pub async fn call_streaming(
    provider: &dyn LlmProvider,
    prompt: &str,
    model: &str,
    max_tokens: u32,
) -> LlmCallOutcome {
    let request = MessageRequest::user(model, prompt, max_tokens);
    let start = Instant::now();

    let collected = match collect(provider, &request).await {
        Ok(collected) => collected,
        Err(e) => {
            let elapsed = start.elapsed();
            warn!(
                provider = provider.name(),
                model = %model,
                error = %e,
                elapsed_ms = duration_ms(elapsed),
                "Provider call failed"
            );
            return LlmCallOutcome::failure(&e, elapsed);
        }
    };

    let total = start.elapsed();
    let ttft = collected.first_token.map(|at| at.duration_since(start));
    let input_tokens = collected.usage.input_tokens.unwrap_or(0);
    let output_tokens = collected.usage.output_tokens.unwrap_or(0);

    let tokens_per_second = calculate_tokens_per_second(
        output_tokens,
        total.as_secs_f64(),
        ttft.map(|d| d.as_secs_f64()),
    );
    let cost_usd = calculate_cost(model, input_tokens, output_tokens);

    debug!(
        model = %model,
        latency_ms = duration_ms(total),
        input_tokens,
        output_tokens,
        "Provider call completed"
    );

    LlmCallOutcome {
        response_text: collected.text,
        ttft_ms: ttft.map(duration_ms),
        latency_ms: duration_ms(total),
        tokens_per_second,
        input_tokens,
        output_tokens,
        cost_usd,
        error: None,
    }
}
