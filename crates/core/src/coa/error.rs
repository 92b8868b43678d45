//! Rule engine error types.

use ledgerline_shared::{DomainError, ErrorClass};
use thiserror::Error;

use crate::error::FromStorage;

/// Errors raised while building codes or administering the rule tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoaError {
    // ========== Code Builder ==========
    /// Type code does not exist.
    #[error("Unknown rule type '{0}'")]
    UnknownType(String),

    /// The type has a group dimension but no group code was supplied.
    #[error("Rule type '{0}' requires a group code")]
    GroupRequired(String),

    /// The group code does not belong to the type.
    #[error("Unknown group '{group_code}' for rule type '{type_code}'")]
    UnknownGroup {
        /// Type code.
        type_code: String,
        /// Group code supplied by the caller.
        group_code: String,
    },

    /// A group code was supplied for a type without a group dimension.
    #[error("Rule type '{type_code}' has no group dimension, got group '{group_code}'")]
    UnexpectedGroup {
        /// Type code.
        type_code: String,
        /// Group code supplied by the caller.
        group_code: String,
    },

    /// More selections than steps.
    #[error("Got {actual} selections for {expected} steps")]
    TooManySelections {
        /// Number of steps in the tree.
        expected: usize,
        /// Number of selections supplied.
        actual: usize,
    },

    /// Selection does not match the step at its position.
    #[error("Selection {position} does not match step '{expected}' (got '{actual}')")]
    StepMismatch {
        /// 1-based step position.
        position: usize,
        /// Category or label of the step.
        expected: String,
        /// Category or label named by the selection.
        actual: String,
    },

    /// Selected value is not an active value of the step's category.
    #[error("Unknown value '{value}' for category '{category}'")]
    UnknownValue {
        /// Category code.
        category: String,
        /// Value supplied by the caller.
        value: String,
    },

    /// Required step has no value.
    #[error("Missing value for step {position} ('{step}')")]
    MissingValue {
        /// 1-based step position.
        position: usize,
        /// Category or label of the step.
        step: String,
    },

    /// Free text contains a separator used by the tree.
    #[error("Text '{text}' at step {position} contains a separator")]
    InvalidText {
        /// 1-based step position.
        position: usize,
        /// Normalized text.
        text: String,
    },

    // ========== Tree administration ==========
    /// Two steps share the same order.
    #[error("Duplicate step order {0}")]
    DuplicateStepOrder(i32),

    /// Category does not exist.
    #[error("Unknown rule category '{0}'")]
    UnknownCategory(String),

    /// Category code already taken.
    #[error("Rule category '{0}' already exists")]
    DuplicateCategory(String),

    /// Value already exists within the category.
    #[error("Value '{value}' already exists in category '{category}'")]
    DuplicateValue {
        /// Category code.
        category: String,
        /// Duplicate value.
        value: String,
    },

    /// Type or group code already taken.
    #[error("Rule tree node '{0}' already exists")]
    DuplicateNode(String),

    /// Code, separator or name is blank.
    #[error("Field '{0}' must not be blank")]
    BlankField(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CoaError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "UNKNOWN_TYPE",
            Self::GroupRequired(_) => "GROUP_REQUIRED",
            Self::UnknownGroup { .. } => "UNKNOWN_GROUP",
            Self::UnexpectedGroup { .. } => "UNEXPECTED_GROUP",
            Self::TooManySelections { .. } => "TOO_MANY_SELECTIONS",
            Self::StepMismatch { .. } => "STEP_MISMATCH",
            Self::UnknownValue { .. } => "UNKNOWN_VALUE",
            Self::MissingValue { .. } => "MISSING_VALUE",
            Self::InvalidText { .. } => "INVALID_TEXT",
            Self::DuplicateStepOrder(_) => "DUPLICATE_STEP_ORDER",
            Self::UnknownCategory(_) => "UNKNOWN_CATEGORY",
            Self::DuplicateCategory(_) => "DUPLICATE_CATEGORY",
            Self::DuplicateValue { .. } => "DUPLICATE_VALUE",
            Self::DuplicateNode(_) => "DUPLICATE_NODE",
            Self::BlankField(_) => "BLANK_FIELD",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed selection
            Self::TooManySelections { .. }
            | Self::StepMismatch { .. }
            | Self::MissingValue { .. }
            | Self::InvalidText { .. }
            | Self::GroupRequired(_)
            | Self::UnexpectedGroup { .. }
            | Self::DuplicateStepOrder(_)
            | Self::BlankField(_) => 400,

            // 422 Unprocessable - references unknown catalog entries
            Self::UnknownType(_)
            | Self::UnknownGroup { .. }
            | Self::UnknownValue { .. }
            | Self::UnknownCategory(_) => 422,

            // 409 Conflict
            Self::DuplicateCategory(_) | Self::DuplicateValue { .. } | Self::DuplicateNode(_) => {
                409
            }

            Self::Database(_) => 503,
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateCategory(_) | Self::DuplicateValue { .. } | Self::DuplicateNode(_) => {
                ErrorClass::Conflict
            }
            Self::Database(_) => ErrorClass::Transient,
            _ => ErrorClass::Validation,
        }
    }
}

impl DomainError for CoaError {
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

impl FromStorage for CoaError {
    fn from_storage(message: String) -> Self {
        Self::Database(message)
    }
}
