//! Application-wide error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Failure classes shared by every domain error.
///
/// The class decides how a caller reacts: validation and state errors are
/// surfaced as-is, conflicts may be retried after re-reading (only when the
/// concrete error says so), integrity failures fail closed and transient
/// failures are retried by the outbox dispatcher only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    /// Bad input, unknown value, missing field.
    Validation,
    /// Operation attempted from a disallowed state.
    State,
    /// Divergent idempotent payload or optimistic lock mismatch.
    Conflict,
    /// Invariant violation or corrupted stored data.
    Integrity,
    /// Storage temporarily unavailable.
    Transient,
}

impl ErrorClass {
    /// Returns true for classes that map to a 5xx-equivalent response.
    #[must_use]
    pub const fn is_server_side(self) -> bool {
        matches!(self, Self::Integrity | Self::Transient)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::State => "state",
            Self::Conflict => "conflict",
            Self::Integrity => "integrity",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

/// Common surface of the domain error enums.
///
/// Implemented by every error type that can leave a public operation, so the
/// idempotency guard and the outer service can map failures without knowing
/// the concrete enum.
pub trait DomainError: std::error::Error {
    /// Machine-readable error code (SCREAMING_SNAKE_CASE).
    fn error_code(&self) -> &'static str;

    /// Failure class of this error.
    fn class(&self) -> ErrorClass;

    /// HTTP-equivalent status code.
    fn status_code(&self) -> u16;

    /// Returns true if the same request may be retried after re-reading state.
    fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Operation not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data violates an invariant.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Storage or downstream dependency unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an application error from any domain error, keeping its message.
    pub fn from_domain<E: DomainError + ?Sized>(err: &E) -> Self {
        let message = format!("{}: {err}", err.error_code());
        match (err.class(), err.status_code()) {
            (ErrorClass::Validation, 404) => Self::NotFound(message),
            (ErrorClass::Validation, 422) => Self::BusinessRule(message),
            (ErrorClass::Validation, _) => Self::Validation(message),
            (ErrorClass::State, _) => Self::InvalidState(message),
            (ErrorClass::Conflict, _) => Self::Conflict(message),
            (ErrorClass::Integrity, _) => Self::Integrity(message),
            (ErrorClass::Transient, _) => Self::Unavailable(message),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::InvalidState(_) | Self::Conflict(_) => 409,
            Self::Unavailable(_) => 503,
            Self::Integrity(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::Integrity(_) => "INTEGRITY_VIOLATION",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("stale")]
    struct Stale;

    impl DomainError for Stale {
        fn error_code(&self) -> &'static str {
            "STALE_WRITE"
        }

        fn class(&self) -> ErrorClass {
            ErrorClass::Conflict
        }

        fn status_code(&self) -> u16 {
            409
        }
    }

    #[derive(Debug, Error)]
    #[error("missing thing")]
    struct Missing;

    impl DomainError for Missing {
        fn error_code(&self) -> &'static str {
            "THING_NOT_FOUND"
        }

        fn class(&self) -> ErrorClass {
            ErrorClass::Validation
        }

        fn status_code(&self) -> u16 {
            404
        }
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::BusinessRule(String::new()).status_code(), 422);
        assert_eq!(AppError::InvalidState(String::new()).status_code(), 409);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::Integrity(String::new()).status_code(), 500);
        assert_eq!(AppError::Unavailable(String::new()).status_code(), 503);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidState(String::new()).error_code(), "INVALID_STATE");
        assert_eq!(
            AppError::Integrity(String::new()).error_code(),
            "INTEGRITY_VIOLATION"
        );
        assert_eq!(
            AppError::Unavailable(String::new()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_from_domain_keeps_code_and_class() {
        let err = AppError::from_domain(&Stale);
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Conflict: STALE_WRITE: stale");

        let err = AppError::from_domain(&Missing);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_default_retryable_only_for_transient() {
        assert!(!Stale.is_retryable());
        assert!(!Missing.is_retryable());
    }

    #[test]
    fn test_server_side_classes() {
        assert!(ErrorClass::Integrity.is_server_side());
        assert!(ErrorClass::Transient.is_server_side());
        assert!(!ErrorClass::Validation.is_server_side());
        assert!(!ErrorClass::State.is_server_side());
        assert!(!ErrorClass::Conflict.is_server_side());
        assert_eq!(ErrorClass::Conflict.to_string(), "conflict");
    }
}
