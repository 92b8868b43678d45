//! Idempotency domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerline_shared::DomainError;
use serde::{Deserialize, Serialize};

/// Status of an idempotency record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdempotencyStatus {
    /// A handler is running for this key.
    InProgress,
    /// Finished with a success response.
    Completed,
    /// Finished with a client-error response.
    Failed,
}

impl IdempotencyStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Returns true if the stored response can be replayed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for IdempotencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response stored for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP-equivalent status code.
    pub status_code: u16,
    /// Response body, stored verbatim.
    pub body: String,
}

impl StoredResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Builds the error response for a domain error.
    ///
    /// The body is `{"error": <code>, "message": <display>}`.
    #[must_use]
    pub fn from_error<E: DomainError + ?Sized>(err: &E) -> Self {
        let body = serde_json::json!({
            "error": err.error_code(),
            "message": err.to_string(),
        });
        Self::new(err.status_code(), body.to_string())
    }

    /// Returns true for 2xx/3xx responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

/// Result of beginning an idempotent operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Run the handler, then finish the key.
    Proceed,
    /// Return the stored response without running the handler.
    Replay(StoredResponse),
}

/// What finishing with a status code does to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// `< 400`: store as COMPLETED.
    Complete,
    /// `400..=499`: store as FAILED, replayable.
    Fail,
    /// `>= 500`: delete the record so a retry can re-attempt.
    Release,
}

impl FinishOutcome {
    /// Maps a response status code to its outcome.
    #[must_use]
    pub const fn for_status(status_code: u16) -> Self {
        match status_code {
            0..=399 => Self::Complete,
            400..=499 => Self::Fail,
            _ => Self::Release,
        }
    }

    /// Returns the status stored for this outcome, if the record is kept.
    #[must_use]
    pub const fn stored_status(self) -> Option<IdempotencyStatus> {
        match self {
            Self::Complete => Some(IdempotencyStatus::Completed),
            Self::Fail => Some(IdempotencyStatus::Failed),
            Self::Release => None,
        }
    }
}

/// The fields of a stored record that drive the begin decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    /// Current status.
    pub status: IdempotencyStatus,
    /// Fingerprint of the request that created the record.
    pub request_hash: String,
    /// When the current attempt started.
    pub locked_at: DateTime<Utc>,
    /// When the record may be garbage-collected.
    pub expires_at: DateTime<Utc>,
    /// Stored response of a terminal record.
    pub response: Option<StoredResponse>,
}
