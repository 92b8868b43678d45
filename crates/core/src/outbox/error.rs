//! Outbox error types.

use ledgerline_shared::{DomainError, ErrorClass};
use thiserror::Error;
use uuid::Uuid;

use crate::error::FromStorage;
use crate::outbox::types::OutboxStatus;

/// Errors that can occur while enqueueing or delivering outbox events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutboxError {
    /// A required field is blank.
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Outbox row not found.
    #[error("Outbox event {0} not found")]
    NotFound(Uuid),

    /// The row is no longer awaiting delivery.
    #[error("Outbox event {id} is {status}")]
    InvalidState {
        /// The row ID.
        id: Uuid,
        /// The current status.
        status: OutboxStatus,
    },

    /// The downstream publisher failed.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl OutboxError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::NotFound(_) => "OUTBOX_EVENT_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Publish(_) => "PUBLISH_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_) => 400,
            Self::NotFound(_) => 404,
            Self::InvalidState { .. } => 409,
            Self::Publish(_) | Self::Database(_) => 503,
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingField(_) | Self::NotFound(_) => ErrorClass::Validation,
            Self::InvalidState { .. } => ErrorClass::State,
            Self::Publish(_) | Self::Database(_) => ErrorClass::Transient,
        }
    }
}

impl DomainError for OutboxError {
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

impl FromStorage for OutboxError {
    fn from_storage(message: String) -> Self {
        Self::Database(message)
    }
}
