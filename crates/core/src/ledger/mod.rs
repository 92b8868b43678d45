//! Double-entry ledger logic.
//!
//! This module implements the pure part of the posting engine:
//! - Domain types for journals and entries
//! - Business rule validation (per-currency balance, non-negative amounts)
//! - Natural balance side of account types
//! - Request fingerprints for idempotent submission
//! - Reversal journals
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod fingerprint;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{AccountType, NormalSide};
pub use error::LedgerError;
pub use fingerprint::request_hash;
pub use reversal::ReversalService;
pub use types::{
    CurrencyTotals, Dc, EntryInput, JournalStatus, PostJournalInput, PostingAccount,
    ResolvedEntry,
};
pub use validation::{
    currency_totals, resolve_entries, validate_account_usage, validate_entries, validate_input,
};
