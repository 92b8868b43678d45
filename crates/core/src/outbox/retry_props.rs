//! Property-based tests for the outbox retry schedule.

use chrono::Duration;
use proptest::prelude::*;

use super::retry::{RetryDecision, RetryPolicy};

fn policy() -> impl Strategy<Value = RetryPolicy> {
    (1u32..20, 1i64..600, 600i64..86_400).prop_map(|(max_attempts, base, max)| {
        RetryPolicy::new(max_attempts, Duration::seconds(base), Duration::seconds(max))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the delay never exceeds the cap and never shrinks between attempts.
    #[test]
    fn prop_backoff_monotonic_and_capped(policy in policy(), attempts in 1u32..64) {
        let current = policy.backoff(attempts);
        let next = policy.backoff(attempts + 1);
        prop_assert!(current <= policy.max_delay);
        prop_assert!(next >= current);
        prop_assert!(current >= policy.base_delay.min(policy.max_delay));
    }

    /// Property: an event is dead exactly when attempts exceed the ceiling.
    #[test]
    fn prop_dead_iff_ceiling_exceeded(policy in policy(), attempts in 1u32..64) {
        let decision = policy.decide(attempts);
        prop_assert_eq!(decision == RetryDecision::Dead, attempts > policy.max_attempts);
    }
}
