//! Reversal of booked journals.
//!
//! A reversal is a new journal mirroring the original's entries with debit
//! and credit swapped. The original moves to REVERSED so it cannot be
//! reversed twice.

use uuid::Uuid;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{JournalStatus, ResolvedEntry};

/// Stateless service for building reversal journals.
pub struct ReversalService;

impl ReversalService {
    /// Returns the idempotency key of the reversal of `original_id`.
    #[must_use]
    pub fn reversal_key(original_id: Uuid) -> String {
        format!("reversal:{original_id}")
    }

    /// Checks that a journal in `status` may be reversed.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the journal is POSTED.
    pub fn ensure_reversible(id: Uuid, status: JournalStatus) -> Result<(), LedgerError> {
        if status.can_transition_to(JournalStatus::Reversed) {
            Ok(())
        } else {
            Err(LedgerError::InvalidState {
                id,
                from: status,
                to: JournalStatus::Reversed,
            })
        }
    }

    /// Mirrors entries with the side flipped.
    ///
    /// Line numbers, accounts, amounts and currencies are preserved. Memos
    /// are prefixed with `Reversal: `.
    #[must_use]
    pub fn reverse_entries(entries: &[ResolvedEntry]) -> Vec<ResolvedEntry> {
        entries
            .iter()
            .map(|entry| ResolvedEntry {
                line_no: entry.line_no,
                account_id: entry.account_id,
                dc: entry.dc.flip(),
                amount: entry.amount,
                currency: entry.currency.clone(),
                memo: Some(format!(
                    "Reversal: {}",
                    entry.memo.as_deref().unwrap_or_default()
                )),
            })
            .collect()
    }
}
