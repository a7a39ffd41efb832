//! Provider error types.

/// Error raised while talking to an LLM provider.
///
/// These never leave [`crate::call_streaming`]; they are rendered into the
/// error string of the call outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Connection or request failure before a response arrived
    #[error("Request failed: {0}")]
    Http(String),

    /// Non-success HTTP status from the provider
    #[error("Provider returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Provider supplied message or raw body
        message: String,
    },

    /// Transport failure while reading the stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// Provider emitted an `error` event mid-stream
    #[error("Provider error event ({error_type}): {message}")]
    Event {
        /// Provider error category, e.g. `overloaded_error`
        error_type: String,
        /// Provider supplied message
        message: String,
    },

    /// Stream payload could not be understood
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Stream closed before the provider signalled completion
    #[error("Stream ended before the message completed")]
    IncompleteStream,

    /// Provider could not be constructed
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Create an API error
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status if the provider answered with one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ProviderError::api(529, "Overloaded");
        assert_eq!(err.to_string(), "Provider returned HTTP 529: Overloaded");
        assert_eq!(err.status(), Some(529));

        assert_eq!(ProviderError::Http("refused".into()).status(), None);
    }
}
