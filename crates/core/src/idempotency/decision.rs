//! Begin/finish decisions of the idempotency guard.

use chrono::{DateTime, Duration, Utc};
use ledgerline_shared::config::IdempotencyConfig;

use crate::idempotency::error::IdempotencyError;
use crate::idempotency::types::{IdempotencyStatus, RecordView, StoredResponse};

/// What `Begin` must do with the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginDecision {
    /// No record: insert a fresh IN_PROGRESS record.
    Insert,
    /// Expired record: overwrite it with a fresh IN_PROGRESS record.
    Reset,
    /// Abandoned IN_PROGRESS attempt: restart its lock clock and proceed.
    TakeOver,
    /// Terminal record: replay the stored response.
    Replay(StoredResponse),
}

/// Retention and stale-attempt timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyPolicy {
    /// Retention of a record after it was first seen.
    pub ttl: Duration,
    /// Age after which an IN_PROGRESS attempt counts as abandoned.
    pub stale_after: Duration,
}

impl IdempotencyPolicy {
    /// Creates a policy from the idempotency configuration section.
    #[must_use]
    pub fn from_config(config: &IdempotencyConfig) -> Self {
        let secs = |s: u64| {
            Duration::try_seconds(i64::try_from(s).unwrap_or(i64::MAX)).unwrap_or(Duration::MAX)
        };
        Self {
            ttl: secs(config.ttl_secs),
            stale_after: secs(config.stale_after_secs),
        }
    }

    /// Expiry of a record first seen at `now`.
    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Decides how `Begin` proceeds for `key`.
    ///
    /// # Errors
    ///
    /// - `MissingKey` if the key is blank
    /// - `KeyReuseConflict` if the live record has another request hash
    /// - `AlreadyInProgress` if a live attempt holds the key
    /// - `Integrity` if a terminal record has no stored response
    pub fn decide_begin(
        &self,
        key: &str,
        existing: Option<&RecordView>,
        request_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<BeginDecision, IdempotencyError> {
        if key.trim().is_empty() {
            return Err(IdempotencyError::MissingKey);
        }

        let Some(record) = existing else {
            return Ok(BeginDecision::Insert);
        };

        if record.expires_at <= now {
            return Ok(BeginDecision::Reset);
        }

        if record.request_hash != request_hash {
            return Err(IdempotencyError::KeyReuseConflict(key.to_string()));
        }

        match record.status {
            IdempotencyStatus::InProgress => {
                if now - record.locked_at >= self.stale_after {
                    Ok(BeginDecision::TakeOver)
                } else {
                    Err(IdempotencyError::AlreadyInProgress(key.to_string()))
                }
            }
            IdempotencyStatus::Completed | IdempotencyStatus::Failed => record
                .response
                .clone()
                .map(BeginDecision::Replay)
                .ok_or_else(|| {
                    IdempotencyError::Integrity(format!(
                        "terminal record '{key}' has no stored response"
                    ))
                }),
        }
    }

    /// Checks that a record can be finished.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the record is IN_PROGRESS.
    pub fn ensure_finishable(key: &str, status: IdempotencyStatus) -> Result<(), IdempotencyError> {
        if status == IdempotencyStatus::InProgress {
            Ok(())
        } else {
            Err(IdempotencyError::InvalidState {
                key: key.to_string(),
                status,
            })
        }
    }
}

impl Default for IdempotencyPolicy {
    fn default() -> Self {
        Self::from_config(&IdempotencyConfig::default())
    }
}
