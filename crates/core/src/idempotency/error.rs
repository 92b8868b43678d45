//! Idempotency error types.

use ledgerline_shared::{DomainError, ErrorClass};
use thiserror::Error;

use crate::error::FromStorage;
use crate::idempotency::types::IdempotencyStatus;

/// Errors raised by the idempotency guard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdempotencyError {
    /// The idempotency key is blank.
    #[error("Idempotency key is required")]
    MissingKey,

    /// The key was first used with a different request.
    #[error("Idempotency key '{0}' was used with a different request")]
    KeyReuseConflict(String),

    /// Another attempt with this key is running.
    #[error("A request with idempotency key '{0}' is already in progress")]
    AlreadyInProgress(String),

    /// The record cannot be finished from its current status.
    #[error("Idempotency key '{key}' is {status}")]
    InvalidState {
        /// The key.
        key: String,
        /// The current status.
        status: IdempotencyStatus,
    },

    /// No record exists for the key.
    #[error("No idempotency record for key '{0}'")]
    RecordNotFound(String),

    /// The stored record is inconsistent.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl IdempotencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingKey => "MISSING_IDEMPOTENCY_KEY",
            Self::KeyReuseConflict(_) => "KEY_REUSE_CONFLICT",
            Self::AlreadyInProgress(_) => "ALREADY_IN_PROGRESS",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
            Self::Integrity(_) => "INTEGRITY_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingKey => 400,
            Self::RecordNotFound(_) => 404,
            Self::KeyReuseConflict(_) | Self::AlreadyInProgress(_) | Self::InvalidState { .. } => {
                409
            }
            Self::Integrity(_) => 500,
            Self::Database(_) => 503,
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingKey | Self::RecordNotFound(_) => ErrorClass::Validation,
            Self::KeyReuseConflict(_) => ErrorClass::Conflict,
            Self::AlreadyInProgress(_) | Self::InvalidState { .. } => ErrorClass::State,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::Database(_) => ErrorClass::Transient,
        }
    }
}

impl DomainError for IdempotencyError {
    fn error_code(&self) -> &'static str {
        Self::error_code(self)
    }

    fn class(&self) -> ErrorClass {
        Self::class(self)
    }

    fn status_code(&self) -> u16 {
        Self::status_code(self)
    }
}

impl FromStorage for IdempotencyError {
    fn from_storage(message: String) -> Self {
        Self::Database(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_reuse_is_conflict_not_retryable() {
        let err = IdempotencyError::KeyReuseConflict("idem-1".to_string());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.class(), ErrorClass::Conflict);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_in_progress_is_state_error() {
        let err = IdempotencyError::AlreadyInProgress("idem-1".to_string());
        assert_eq!(err.error_code(), "ALREADY_IN_PROGRESS");
        assert_eq!(err.class(), ErrorClass::State);
    }

    #[test]
    fn test_invalid_state_display() {
        let err = IdempotencyError::InvalidState {
            key: "idem-1".to_string(),
            status: IdempotencyStatus::Completed,
        };
        assert_eq!(err.to_string(), "Idempotency key 'idem-1' is COMPLETED");
    }
}
