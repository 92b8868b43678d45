//! Property-based tests for idempotency decisions.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::decision::{BeginDecision, IdempotencyPolicy};
use super::error::IdempotencyError;
use super::types::{FinishOutcome, IdempotencyStatus, RecordView, StoredResponse};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a finished record with the same hash replays its exact body
    /// for as long as it lives.
    #[test]
    fn prop_terminal_record_replays_verbatim(
        status_code in 200u16..500,
        body in ".{0,64}",
        age_secs in 0i64..86_399,
    ) {
        let policy = IdempotencyPolicy::default();
        let outcome = FinishOutcome::for_status(status_code);
        let status = outcome.stored_status().unwrap();
        let record = RecordView {
            status,
            request_hash: "hash".to_string(),
            locked_at: base(),
            expires_at: policy.expires_at(base()),
            response: Some(StoredResponse::new(status_code, body.clone())),
        };

        let decision = policy
            .decide_begin("key", Some(&record), "hash", base() + Duration::seconds(age_secs))
            .unwrap();
        prop_assert_eq!(decision, BeginDecision::Replay(StoredResponse::new(status_code, body)));
    }

    /// Property: a live record never accepts a different request hash.
    #[test]
    fn prop_live_record_rejects_other_hash(
        in_progress in any::<bool>(),
        age_secs in 0i64..86_399,
        other in "[a-f0-9]{8}",
    ) {
        prop_assume!(other != "hash");
        let policy = IdempotencyPolicy::default();
        let record = RecordView {
            status: if in_progress { IdempotencyStatus::InProgress } else { IdempotencyStatus::Completed },
            request_hash: "hash".to_string(),
            locked_at: base(),
            expires_at: policy.expires_at(base()),
            response: (!in_progress).then(|| StoredResponse::new(200, "{}")),
        };

        let result = policy.decide_begin("key", Some(&record), &other, base() + Duration::seconds(age_secs));
        prop_assert_eq!(result, Err(IdempotencyError::KeyReuseConflict("key".to_string())));
    }

    /// Property: 5xx responses are never stored.
    #[test]
    fn prop_server_errors_release(status_code in 500u16..600) {
        prop_assert_eq!(FinishOutcome::for_status(status_code), FinishOutcome::Release);
        prop_assert_eq!(FinishOutcome::for_status(status_code).stored_status(), None);
    }
}
