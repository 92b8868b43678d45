//! Retry schedule for failed deliveries.

use chrono::Duration;
use ledgerline_shared::config::OutboxConfig;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the delay.
    Retry {
        /// Delay before the next attempt.
        delay: Duration,
    },
    /// Stop retrying.
    Dead,
}

/// Exponential backoff with a cap and an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts allowed before an event is dead-lettered.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Upper bound of the delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Creates a policy from the outbox configuration section.
    #[must_use]
    pub fn from_config(config: &OutboxConfig) -> Self {
        let secs = |s: u64| {
            Duration::try_seconds(i64::try_from(s).unwrap_or(i64::MAX)).unwrap_or(Duration::MAX)
        };
        Self::new(
            config.max_attempts,
            secs(config.base_backoff_secs),
            secs(config.max_backoff_secs),
        )
    }

    /// Delay after the `attempts`-th failure: `base · 2^(attempts − 1)`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(30);
        let factor = 1_i32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Decides what happens after the `attempts`-th failure.
    ///
    /// An event is dead once its attempt count exceeds `max_attempts`.
    #[must_use]
    pub fn decide(&self, attempts: u32) -> RetryDecision {
        if attempts > self.max_attempts {
            RetryDecision::Dead
        } else {
            RetryDecision::Retry {
                delay: self.backoff(attempts),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&OutboxConfig::default())
    }
}
