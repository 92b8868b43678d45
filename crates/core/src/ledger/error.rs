//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur while posting or
//! reversing journals: input validation, account checks, idempotency
//! conflicts, state transitions and optimistic-lock mismatches.

use ledgerline_shared::{DomainError, ErrorClass};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::error::FromStorage;
use crate::ledger::types::JournalStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// A required field is blank.
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Journal must have at least 2 entries.
    #[error("Journal must have at least 2 entries")]
    InsufficientEntries,

    /// Entry amount cannot be negative.
    #[error("Entry {line_no} has a negative amount")]
    NegativeAmount {
        /// Line number of the offending entry.
        line_no: i32,
    },

    /// Journal has only debits or only credits.
    #[error("Journal must have at least one debit and one credit")]
    SingleSided,

    /// Debits and credits differ for a currency.
    #[error("Journal is not balanced in {currency}. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Currency code.
        currency: String,
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A side total exceeds the representable amount range.
    #[error("Journal totals overflow in {currency}")]
    AmountOverflow {
        /// Currency code.
        currency: String,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(Uuid),

    /// Entry currency differs from the account currency.
    #[error("Account {account_id} is held in {expected}, entry is in {actual}")]
    CurrencyMismatch {
        /// The account ID.
        account_id: Uuid,
        /// Currency of the account.
        expected: String,
        /// Currency of the entry.
        actual: String,
    },

    // ========== Journal State Errors ==========
    /// Journal not found.
    #[error("Journal not found: {0}")]
    JournalNotFound(Uuid),

    /// The idempotency key was used for a different payload.
    #[error("Idempotency key '{0}' was already used for a different journal")]
    DuplicateSubmission(String),

    /// Status transition not allowed.
    #[error("Journal {id} cannot move from {from} to {to}")]
    InvalidState {
        /// Journal ID.
        id: Uuid,
        /// Current status.
        from: JournalStatus,
        /// Requested status.
        to: JournalStatus,
    },

    // ========== Concurrency Errors ==========
    /// Lock version changed since the journal was read.
    #[error("Journal {id} was modified concurrently (expected version {expected}), please retry")]
    StaleWrite {
        /// Journal ID.
        id: Uuid,
        /// Version the writer expected.
        expected: i32,
    },

    // ========== Integrity Errors ==========
    /// Stored data violates a ledger invariant.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InsufficientEntries => "INSUFFICIENT_ENTRIES",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::SingleSided => "SINGLE_SIDED",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::JournalNotFound(_) => "JOURNAL_NOT_FOUND",
            Self::DuplicateSubmission(_) => "DUPLICATE_SUBMISSION",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::StaleWrite { .. } => "STALE_WRITE",
            Self::Integrity(_) => "INTEGRITY_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::MissingField(_)
            | Self::InsufficientEntries
            | Self::NegativeAmount { .. }
            | Self::SingleSided => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::JournalNotFound(_) => 404,

            // 422 Unprocessable - well-formed but violates a ledger rule
            Self::Unbalanced { .. }
            | Self::AmountOverflow { .. }
            | Self::AccountInactive(_)
            | Self::CurrencyMismatch { .. } => 422,

            // 409 Conflict
            Self::DuplicateSubmission(_) | Self::InvalidState { .. } | Self::StaleWrite { .. } => {
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
            Self::InvalidState { .. } => ErrorClass::State,
            Self::DuplicateSubmission(_) | Self::StaleWrite { .. } => ErrorClass::Conflict,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::Database(_) => ErrorClass::Transient,
            _ => ErrorClass::Validation,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleWrite { .. } | Self::Database(_))
    }
}

impl DomainError for LedgerError {
    fn error_code(&self) -> &'static str {
        Self::error_code(self)
    }

    fn class(&self) -> ErrorClass {
        Self::class(self)
    }

    fn status_code(&self) -> u16 {
        Self::status_code(self)
    }

    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

impl FromStorage for LedgerError {
    fn from_storage(message: String) -> Self {
        Self::Database(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientEntries.error_code(),
            "INSUFFICIENT_ENTRIES"
        );
        assert_eq!(
            LedgerError::Unbalanced {
                currency: "USD".to_string(),
                debit: dec!(100),
                credit: dec!(90),
            }
            .error_code(),
            "UNBALANCED"
        );
        assert_eq!(
            LedgerError::DuplicateSubmission("idem-1".to_string()).error_code(),
            "DUPLICATE_SUBMISSION"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::InsufficientEntries.status_code(), 400);
        assert_eq!(LedgerError::AccountNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(LedgerError::AccountInactive(Uuid::nil()).status_code(), 422);
        assert_eq!(
            LedgerError::StaleWrite {
                id: Uuid::nil(),
                expected: 1
            }
            .status_code(),
            409
        );
        assert_eq!(LedgerError::Integrity("x".to_string()).status_code(), 500);
        assert_eq!(LedgerError::Database("x".to_string()).status_code(), 503);
    }

    #[test]
    fn test_classes() {
        assert_eq!(
            LedgerError::InvalidState {
                id: Uuid::nil(),
                from: JournalStatus::Reversed,
                to: JournalStatus::Reversed,
            }
            .class(),
            ErrorClass::State
        );
        assert_eq!(
            LedgerError::DuplicateSubmission(String::new()).class(),
            ErrorClass::Conflict
        );
        assert_eq!(
            LedgerError::Integrity(String::new()).class(),
            ErrorClass::Integrity
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            LedgerError::StaleWrite {
                id: Uuid::nil(),
                expected: 0
            }
            .is_retryable()
        );
        assert!(LedgerError::Database("timeout".to_string()).is_retryable());
        assert!(!LedgerError::DuplicateSubmission(String::new()).is_retryable());
        assert!(!LedgerError::InsufficientEntries.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            currency: "USD".to_string(),
            debit: dec!(100.00),
            credit: dec!(90.00),
        };
        assert_eq!(
            err.to_string(),
            "Journal is not balanced in USD. Debit: 100.00, Credit: 90.00"
        );
    }
}
