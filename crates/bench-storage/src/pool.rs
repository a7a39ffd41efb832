//! Database connection pool management.

use crate::config::{is_in_memory, DatabaseType};
use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use sqlx::{any::AnyPoolOptions, AnyPool};
use std::time::Duration;
use tracing::{debug, info};

/// Pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections.
    pub max_connections: u32,
    /// Minimum number of connections.
    pub min_connections: u32,
    /// Time to wait for a free connection.
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// Idle timeout for connections.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Maximum lifetime for a connection.
    #[serde(with = "humantime_serde")]
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolConfig {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// Builder for pool configuration.
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Set maximum connections.
    #[must_use]
    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Set minimum connections.
    #[must_use]
    pub fn min_connections(mut self, min: u32) -> Self {
        self.config.min_connections = min;
        self
    }

    /// Set acquire timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = timeout;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

/// Database connection pool.
#[derive(Clone)]
pub struct DatabasePool {
    pool: AnyPool,
    database_type: DatabaseType,
    max_connections: u32,
}

impl DatabasePool {
    /// Connect to `url`.
    ///
    /// An in-memory SQLite database lives only as long as its connection, so
    /// it is pinned to one connection that is never recycled.
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let database_type = DatabaseType::from_url(url).ok_or_else(|| {
            StorageError::Config(format!("unsupported database URL scheme: {url}"))
        })?;

        let options = if is_in_memory(url) {
            debug!("Using single pinned connection for in-memory SQLite");
            AnyPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            AnyPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections.min(config.max_connections))
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(Some(config.idle_timeout))
                .max_lifetime(Some(config.max_lifetime))
        };

        let pool = options
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        info!(database = %database_type, "Database pool connected");

        Ok(Self {
            pool,
            database_type,
            max_connections: if is_in_memory(url) {
                1
            } else {
                config.max_connections
            },
        })
    }

    /// Connect to a fresh private in-memory SQLite database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", &PoolConfig::default()).await
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database type.
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max_connections: self.max_connections,
        }
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("database_type", &self.database_type)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Pool statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Current number of connections.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum connections allowed.
    pub max_connections: u32,
}

impl PoolStats {
    /// Get the number of active connections.
    #[must_use]
    pub fn active(&self) -> usize {
        (self.size as usize).saturating_sub(self.idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::builder()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .build();

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_pool_config_humantime() {
        let config: PoolConfig = serde_json::from_str(
            r#"{"max_connections":2,"min_connections":1,"acquire_timeout":"5s","idle_timeout":"10m","max_lifetime":"30m"}"#,
        )
        .unwrap();
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_in_memory_pool() {
        let pool = DatabasePool::in_memory().await.unwrap();
        assert_eq!(pool.database_type(), DatabaseType::SQLite);
        assert_eq!(pool.stats().max_connections, 1);
        pool.ping().await.unwrap();

        pool.close().await;
        assert!(pool.is_closed());
        assert!(pool.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let err = DatabasePool::connect("mysql://localhost/bench", &PoolConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }
}
