//! Snapshot error types.

use chrono::NaiveDate;
use ledgerline_shared::{DomainError, ErrorClass};
use thiserror::Error;
use uuid::Uuid;

use crate::error::FromStorage;
use crate::snapshot::compute::SnapshotStatus;

/// Errors that can occur while computing or publishing snapshots.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Snapshot not found.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(Uuid),

    /// A LOCKED snapshot exists for the date and cannot be recomputed.
    #[error("Snapshot of account {account_id} as of {as_of_date} is locked")]
    SnapshotLocked {
        /// The account ID.
        account_id: Uuid,
        /// The snapshot date.
        as_of_date: NaiveDate,
    },

    /// Status transition not allowed.
    #[error("Snapshot {id} is {status}")]
    InvalidState {
        /// The snapshot ID.
        id: Uuid,
        /// The current status.
        status: SnapshotStatus,
    },

    /// Stored account data cannot be interpreted.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SnapshotError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::SnapshotNotFound(_) => "SNAPSHOT_NOT_FOUND",
            Self::SnapshotLocked { .. } => "SNAPSHOT_LOCKED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Integrity(_) => "INTEGRITY_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) | Self::SnapshotNotFound(_) => 404,
            Self::SnapshotLocked { .. } | Self::InvalidState { .. } => 409,
            Self::Integrity(_) => 500,
            Self::Database(_) => 503,
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::AccountNotFound(_) | Self::SnapshotNotFound(_) => ErrorClass::Validation,
            Self::SnapshotLocked { .. } | Self::InvalidState { .. } => ErrorClass::State,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::Database(_) => ErrorClass::Transient,
        }
    }
}

impl DomainError for SnapshotError {
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

impl FromStorage for SnapshotError {
    fn from_storage(message: String) -> Self {
        Self::Database(message)
    }
}
