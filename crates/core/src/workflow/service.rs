//! Workflow service for account request decisions.
//!
//! This module implements the maker-checker state machine. Only PENDING
//! requests can be decided, and a decision is final.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{RequestStatus, WorkflowAction};

/// Stateless service for deciding account requests.
///
/// All methods are associated functions that validate a decision and return
/// the `WorkflowAction` carrying its audit trail.
pub struct WorkflowService;

impl WorkflowService {
    /// Approve a pending request.
    ///
    /// # Arguments
    /// * `request_id` - The request being decided
    /// * `current_status` - The current status of the request
    /// * `maker_id` - The user who submitted the request
    /// * `checker_id` - The user approving the request
    /// * `comment` - Optional checker comment
    /// * `now` - Decision time
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Approve)` if the transition is valid
    /// * `Err(WorkflowError::InvalidState)` if not in Pending status
    /// * `Err(WorkflowError::SelfApproval)` if the checker is the maker
    pub fn approve(
        request_id: Uuid,
        current_status: RequestStatus,
        maker_id: Uuid,
        checker_id: Uuid,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::ensure_pending(request_id, current_status)?;

        if maker_id == checker_id {
            return Err(WorkflowError::SelfApproval);
        }

        Ok(WorkflowAction::Approve {
            new_status: RequestStatus::Approved,
            checker_id,
            checked_at: now,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }

    /// Reject a pending request.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Reject)` if the transition is valid
    /// * `Err(WorkflowError::InvalidState)` if not in Pending status
    /// * `Err(WorkflowError::RejectionReasonRequired)` if reason is blank
    pub fn reject(
        request_id: Uuid,
        current_status: RequestStatus,
        checker_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::ensure_pending(request_id, current_status)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        Ok(WorkflowAction::Reject {
            new_status: RequestStatus::Rejected,
            checker_id,
            checked_at: now,
            reason: reason.to_string(),
        })
    }

    /// Checks that a request can still be decided.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the request is PENDING.
    pub fn ensure_pending(request_id: Uuid, status: RequestStatus) -> Result<(), WorkflowError> {
        if status == RequestStatus::Pending {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState {
                id: request_id,
                status,
            })
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Rejected (reject)
    #[must_use]
    pub const fn is_valid_transition(from: RequestStatus, to: RequestStatus) -> bool {
        matches!(
            (from, to),
            (
                RequestStatus::Pending,
                RequestStatus::Approved | RequestStatus::Rejected
            )
        )
    }
}
