//! Property-based tests for the maker-checker state machine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use super::error::WorkflowError;
use super::service::WorkflowService;
use super::types::RequestStatus;

fn status_strategy() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(RequestStatus::Pending),
        Just(RequestStatus::Approved),
        Just(RequestStatus::Rejected),
    ]
}

fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a decision succeeds only from PENDING, whatever the decision.
    #[test]
    fn prop_only_pending_is_decidable(
        status in status_strategy(),
        maker in uuid_strategy(),
        checker in uuid_strategy(),
        approve in any::<bool>(),
    ) {
        prop_assume!(maker != checker);
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let result = if approve {
            WorkflowService::approve(Uuid::nil(), status, maker, checker, None, now)
        } else {
            WorkflowService::reject(Uuid::nil(), status, checker, "duplicate", now)
        };

        if status == RequestStatus::Pending {
            let action = result.unwrap();
            prop_assert!(WorkflowService::is_valid_transition(status, action.new_status()));
            prop_assert!(action.new_status().is_terminal());
        } else {
            prop_assert!(
                matches!(result, Err(WorkflowError::InvalidState { .. })),
                "expected InvalidState, got {:?}",
                result
            );
        }
    }

    /// Property: nobody can approve their own request.
    #[test]
    fn prop_self_approval_never_allowed(user in uuid_strategy()) {
        let result = WorkflowService::approve(
            Uuid::nil(),
            RequestStatus::Pending,
            user,
            user,
            None,
            Utc::now(),
        );
        prop_assert_eq!(result, Err(WorkflowError::SelfApproval));
    }
}
