//! Property-based tests for journal validation and reversal.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::LedgerError;
use super::reversal::ReversalService;
use super::types::{Dc, ResolvedEntry};
use super::validation::{currency_totals, validate_entries};

/// Strategy to generate a non-negative amount (0.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn currency() -> impl Strategy<Value = String> {
    prop_oneof![Just("USD".to_string()), Just("EUR".to_string())]
}

fn entry(line_no: i32, dc: Dc, amount: Decimal, currency: &str) -> ResolvedEntry {
    ResolvedEntry {
        line_no,
        account_id: Uuid::nil(),
        dc,
        amount,
        currency: currency.to_string(),
        memo: None,
    }
}

/// Strategy for a balanced journal: each (amount, currency) pair becomes a
/// debit and a matching credit.
fn balanced_entries() -> impl Strategy<Value = Vec<ResolvedEntry>> {
    prop::collection::vec((amount(), currency()), 1..6).prop_map(|legs| {
        let mut entries = Vec::with_capacity(legs.len() * 2);
        let mut line_no = 0;
        for (amount, currency) in legs {
            line_no += 1;
            entries.push(entry(line_no, Dc::D, amount, &currency));
            line_no += 1;
            entries.push(entry(line_no, Dc::C, amount, &currency));
        }
        entries
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: balanced journals validate and every currency total balances.
    #[test]
    fn prop_balanced_journal_accepted(entries in balanced_entries()) {
        let totals = validate_entries(&entries).unwrap();
        prop_assert!(totals.iter().all(|t| t.debit == t.credit));
    }

    /// Property: shifting one amount by a non-zero delta always unbalances the journal.
    #[test]
    fn prop_shifted_amount_rejected(
        entries in balanced_entries(),
        delta in (1i64..10_000i64).prop_map(|c| Decimal::new(c, 2)),
    ) {
        let mut entries = entries;
        entries[0].amount += delta;
        let result = validate_entries(&entries);
        prop_assert!(
            matches!(result, Err(LedgerError::Unbalanced { .. })),
            "expected Unbalanced, got {:?}",
            result
        );
    }

    /// Property: a reversal of a balanced journal is balanced with identical totals.
    #[test]
    fn prop_reversal_preserves_balance(entries in balanced_entries()) {
        let reversed = ReversalService::reverse_entries(&entries);
        let original_totals = currency_totals(&entries).unwrap();
        let reversed_totals = currency_totals(&reversed).unwrap();

        prop_assert!(validate_entries(&reversed).is_ok());
        for (o, r) in original_totals.iter().zip(&reversed_totals) {
            prop_assert_eq!(&o.currency, &r.currency);
            prop_assert_eq!(o.debit, r.credit);
            prop_assert_eq!(o.credit, r.debit);
        }
    }

    /// Property: a journal plus its reversal nets to zero per account side.
    #[test]
    fn prop_journal_and_reversal_net_to_zero(entries in balanced_entries()) {
        let reversed = ReversalService::reverse_entries(&entries);
        let net: Decimal = entries
            .iter()
            .chain(&reversed)
            .map(|e| match e.dc {
                Dc::D => e.amount,
                Dc::C => -e.amount,
            })
            .sum();
        prop_assert_eq!(net, Decimal::ZERO);
    }
}
