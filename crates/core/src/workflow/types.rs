//! Workflow domain types for account change requests.
//!
//! This module defines the request kinds and statuses of the maker-checker
//! workflow, the account status they may set, and the workflow actions that
//! carry the audit trail of a decision.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of account change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    /// Create a new account.
    Create,
    /// Edit `account_no`, `status` or `description` of an existing account.
    Edit,
}

impl RequestType {
    /// Returns the string representation of the request type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request status in the maker-checker workflow.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
///
/// Approved and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Waiting for a checker.
    Pending,
    /// Approved; the account change was applied.
    Approved,
    /// Rejected; nothing was applied.
    Rejected,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Accepts postings.
    Active,
    /// Rejects postings.
    Inactive,
}

impl AccountStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision on a pending request, with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Approve the request and apply the account change.
    Approve {
        /// The new status (Approved).
        new_status: RequestStatus,
        /// The checker who approved.
        checker_id: Uuid,
        /// When the request was approved.
        checked_at: DateTime<Utc>,
        /// Optional checker comment.
        comment: Option<String>,
    },
    /// Reject the request without touching the account.
    Reject {
        /// The new status (Rejected).
        new_status: RequestStatus,
        /// The checker who rejected.
        checker_id: Uuid,
        /// When the request was rejected.
        checked_at: DateTime<Utc>,
        /// The reason for rejection.
        reason: String,
    },
}

impl WorkflowAction {
    /// Returns the status the request moves to.
    #[must_use]
    pub const fn new_status(&self) -> RequestStatus {
        match self {
            Self::Approve { new_status, .. } | Self::Reject { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_value(RequestType::Create).unwrap(),
            serde_json::json!("CREATE")
        );
        assert_eq!(
            serde_json::to_value(AccountStatus::Inactive).unwrap(),
            serde_json::json!("INACTIVE")
        );
        assert_eq!(RequestStatus::Rejected.to_string(), "REJECTED");
    }
}
