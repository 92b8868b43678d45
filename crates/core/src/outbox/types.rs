//! Outbox delivery types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Delivery status of an outbox row.
///
/// The valid transitions are:
/// - Pending → Published | Failed | Dead
/// - Failed → Published | Failed | Dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    /// Waiting for its first delivery attempt.
    Pending,
    /// Delivered.
    Published,
    /// Last attempt failed, retry scheduled.
    Failed,
    /// Gave up after the configured number of attempts.
    Dead,
}

impl OutboxStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Published => "PUBLISHED",
            Self::Failed => "FAILED",
            Self::Dead => "DEAD",
        }
    }

    /// Returns true if the row still awaits delivery.
    #[must_use]
    pub const fn is_deliverable(self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the deduplication key of an event.
#[must_use]
pub fn event_key(aggregate_type: &str, aggregate_id: &str, event_type: &str) -> String {
    format!("{aggregate_type}:{aggregate_id}:{event_type}")
}
