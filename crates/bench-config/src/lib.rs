//! # Bench Config
//!
//! Configuration for the LLM Benchmark API.
//!
//! Settings are read once at process start from the environment, after an
//! optional `.env` file in the working directory has been loaded. The
//! resulting [`BenchConfig`] is passed by reference to whatever needs it;
//! there is no global settings object.
//!
//! | variable | default |
//! |---|---|
//! | `DATABASE_URL` | `sqlite://llm_benchmark.db?mode=rwc` |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |
//! | `ANTHROPIC_API_KEY` | empty |
//! | `ANTHROPIC_BASE_URL` | `https://api.anthropic.com` |
//! | `BENCH_MAX_TOKENS` | `1024` |
//! | `BENCH_HOST` | `0.0.0.0` |
//! | `BENCH_PORT` | `8000` |
//! | `LOG_LEVEL` | `info` |
//! | `LOG_FORMAT` | `text` |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to a value that could not be used
    #[error("Invalid value for {key}: {message}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// What was wrong
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerSettings {
    /// `host:port` string for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Relational store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Connection string (`sqlite:` or `postgres://`)
    pub url: String,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://llm_benchmark.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// LLM provider settings
#[derive(Clone)]
pub struct ProviderSettings {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Anthropic API base URL
    pub base_url: String,
    /// `max_tokens` sent with every prompt
    pub max_tokens: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: SecretString::new(String::new()),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
        }
    }
}

impl ProviderSettings {
    /// Whether an API key has been configured
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &if self.has_api_key() { "[REDACTED]" } else { "<unset>" })
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `bench_runner=debug,info`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct BenchConfig {
    /// HTTP listener
    pub server: ServerSettings,
    /// Relational store
    pub database: DatabaseSettings,
    /// LLM provider
    pub provider: ProviderSettings,
    /// Logging
    pub logging: LoggingSettings,
}

impl BenchConfig {
    /// Load `.env` (if present) and then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::invalid(".env", e.to_string())),
        }
        Self::from_env()
    }

    /// Read configuration from the process environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an explicit map of variables.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database.url = url;
        }
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &max)?;
        }

        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            config.provider.api_key = SecretString::new(key);
        }
        if let Some(base_url) = lookup("ANTHROPIC_BASE_URL") {
            config.provider.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(max_tokens) = lookup("BENCH_MAX_TOKENS") {
            config.provider.max_tokens = parse("BENCH_MAX_TOKENS", &max_tokens)?;
        }

        if let Some(host) = lookup("BENCH_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("BENCH_PORT") {
            config.server.port = parse("BENCH_PORT", &port)?;
        }

        if let Some(level) = lookup("LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            config.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.logging.format = format
                .parse()
                .map_err(|e: String| ConfigError::invalid("LOG_FORMAT", e))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::invalid("DATABASE_URL", "must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "DATABASE_MAX_CONNECTIONS",
                "must be greater than zero",
            ));
        }
        if self.provider.max_tokens == 0 {
            return Err(ConfigError::invalid("BENCH_MAX_TOKENS", "must be greater than zero"));
        }
        url::Url::parse(&self.provider.base_url)
            .map_err(|e| ConfigError::invalid("ANTHROPIC_BASE_URL", e.to_string()))?;
        Ok(())
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, format!("'{value}': {e}")))
}
