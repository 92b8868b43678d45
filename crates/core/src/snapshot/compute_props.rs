//! Property-based tests for snapshot computation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::compute::SnapshotCalculator;
use crate::ledger::{AccountType, Dc};

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Revenue),
        Just(AccountType::Expense),
    ]
}

fn entries() -> impl Strategy<Value = Vec<(Dc, Decimal)>> {
    prop::collection::vec((prop_oneof![Just(Dc::D), Just(Dc::C)], amount()), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: opening + movement == closing, always.
    #[test]
    fn prop_closing_equals_opening_plus_movement(
        account_type in account_type(),
        opening in signed_amount(),
        entries in entries(),
    ) {
        let as_of = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let figures = SnapshotCalculator::compute(Uuid::nil(), as_of, account_type, opening, entries.clone()).unwrap();

        prop_assert_eq!(figures.opening_balance + figures.movement, figures.closing_balance);
        prop_assert_eq!(figures.entry_count, i64::try_from(entries.len()).unwrap());
    }

    /// Property: recomputing over unchanged entries reproduces the identical hash.
    #[test]
    fn prop_recompute_reproduces_hash(
        account_type in account_type(),
        opening in signed_amount(),
        entries in entries(),
    ) {
        let as_of = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let account = Uuid::from_u128(42);
        let first = SnapshotCalculator::compute(account, as_of, account_type, opening, entries.clone()).unwrap();
        let second = SnapshotCalculator::compute(account, as_of, account_type, opening, entries).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: movement sign follows the account's normal side.
    #[test]
    fn prop_movement_follows_normal_side(debit in amount(), credit in amount()) {
        let as_of = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let legs = vec![(Dc::D, debit), (Dc::C, credit)];
        let asset = SnapshotCalculator::compute(Uuid::nil(), as_of, AccountType::Asset, Decimal::ZERO, legs.clone()).unwrap();
        let liability = SnapshotCalculator::compute(Uuid::nil(), as_of, AccountType::Liability, Decimal::ZERO, legs).unwrap();
        prop_assert_eq!(asset.movement, -liability.movement);
        prop_assert_eq!(asset.movement, debit - credit);
    }
}
