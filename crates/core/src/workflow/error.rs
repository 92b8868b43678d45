//! Workflow error types for account change requests.
//!
//! This module defines all error types that can occur while submitting,
//! approving or rejecting account requests.

use ledgerline_shared::{DomainError, ErrorClass};
use thiserror::Error;
use uuid::Uuid;

use crate::coa::CoaError;
use crate::error::FromStorage;
use crate::workflow::types::RequestStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Request payload could not be decoded.
    #[error("Malformed request payload: {0}")]
    DecodeError(String),

    /// Account type could not be derived from the payload.
    #[error("Unknown account type '{0}'")]
    UnknownAccountType(String),

    /// EDIT request without an account reference.
    #[error("EDIT requests must reference an account")]
    MissingReference,

    /// EDIT request that changes nothing.
    #[error("EDIT request changes nothing")]
    EmptyEdit,

    /// Code building failed.
    #[error(transparent)]
    Coa(#[from] CoaError),

    /// Request not found.
    #[error("Account request {0} not found")]
    RequestNotFound(Uuid),

    /// Account not found.
    #[error("Account {0} not found")]
    AccountNotFound(Uuid),

    /// An account with the same code and currency exists.
    #[error("Account {code} in {currency} already exists")]
    DuplicateAccount {
        /// Account code.
        code: String,
        /// Currency code.
        currency: String,
    },

    /// The account already has a pending request.
    #[error("Account {0} already has a pending request")]
    PendingRequestExists(Uuid),

    /// The request is not pending.
    #[error("Request {id} is {status}, only PENDING requests can be decided")]
    InvalidState {
        /// The request ID.
        id: Uuid,
        /// The current status.
        status: RequestStatus,
    },

    /// The maker tried to approve their own request.
    #[error("The maker of a request cannot approve it")]
    SelfApproval,

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// A stored payload no longer decodes.
    #[error("Stored payload of request is corrupt: {0}")]
    CorruptPayload(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::DecodeError(_)
            | Self::MissingReference
            | Self::EmptyEdit
            | Self::RejectionReasonRequired => 400,

            Self::RequestNotFound(_) | Self::AccountNotFound(_) => 404,

            Self::UnknownAccountType(_) | Self::SelfApproval => 422,

            Self::DuplicateAccount { .. }
            | Self::PendingRequestExists(_)
            | Self::InvalidState { .. } => 409,

            Self::Coa(err) => err.status_code(),

            Self::CorruptPayload(_) => 500,
            Self::Database(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::MissingReference => "MISSING_REFERENCE",
            Self::EmptyEdit => "EMPTY_EDIT",
            Self::Coa(err) => err.error_code(),
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            Self::PendingRequestExists(_) => "PENDING_REQUEST_EXISTS",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::SelfApproval => "SELF_APPROVAL",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::CorruptPayload(_) => "CORRUPT_PAYLOAD",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::PendingRequestExists(_) | Self::InvalidState { .. } => ErrorClass::State,
            Self::DuplicateAccount { .. } => ErrorClass::Conflict,
            Self::Coa(err) => err.class(),
            Self::CorruptPayload(_) => ErrorClass::Integrity,
            Self::Database(_) => ErrorClass::Transient,
            _ => ErrorClass::Validation,
        }
    }
}

impl DomainError for WorkflowError {
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

impl FromStorage for WorkflowError {
    fn from_storage(message: String) -> Self {
        Self::Database(message)
    }
}
