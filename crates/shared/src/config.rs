//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Outbox retry configuration.
    #[serde(default)]
    pub outbox: OutboxConfig,
    /// Idempotency guard configuration.
    #[serde(default)]
    pub idempotency: IdempotencyConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Outbox delivery configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OutboxConfig {
    /// Failed attempts allowed before an event is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds.
    #[serde(default = "default_base_backoff")]
    pub base_backoff_secs: u64,
    /// Upper bound of the retry delay, in seconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
    /// Rows claimed per dispatcher round.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Pause between dispatcher rounds, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    8
}

fn default_base_backoff() -> u64 {
    5
}

fn default_max_backoff() -> u64 {
    3600 // 1 hour
}

fn default_batch_size() -> u64 {
    100
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_secs: default_base_backoff(),
            max_backoff_secs: default_max_backoff(),
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl OutboxConfig {
    /// Pause between dispatcher rounds.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Idempotency guard configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdempotencyConfig {
    /// Retention of a record after it was first seen, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Age after which an IN_PROGRESS record is considered abandoned.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

fn default_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_stale_after() -> u64 {
    300 // 5 minutes
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            stale_after_secs: default_stale_after(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERLINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
