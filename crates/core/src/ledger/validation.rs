//! Business rule validation for journals.
//!
//! Every check here runs before anything is written:
//! - A journal has at least two entries
//! - Amounts are never negative
//! - Both a debit and a credit side are present
//! - Debits equal credits per currency
//! - Referenced accounts are active and held in the entry currency

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{
    CurrencyTotals, Dc, EntryInput, PostJournalInput, PostingAccount, ResolvedEntry,
};

/// Applies defaults and assigns line numbers `1..=N` in caller order.
#[must_use]
pub fn resolve_entries(journal_currency: &str, entries: &[EntryInput]) -> Vec<ResolvedEntry> {
    entries
        .iter()
        .zip(1..)
        .map(|(entry, line_no)| ResolvedEntry {
            line_no,
            account_id: entry.account_id,
            dc: entry.dc,
            amount: entry.amount,
            currency: entry
                .currency
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(journal_currency)
                .to_uppercase(),
            memo: entry.memo.clone(),
        })
        .collect()
}

/// Sums debits and credits per currency, ordered by currency code.
///
/// # Errors
///
/// `AmountOverflow` if a side total leaves the `Decimal` range.
pub fn currency_totals(entries: &[ResolvedEntry]) -> Result<Vec<CurrencyTotals>, LedgerError> {
    let mut totals: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();

    for entry in entries {
        let (debit, credit) = totals
            .entry(entry.currency.as_str())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        let side = match entry.dc {
            Dc::D => debit,
            Dc::C => credit,
        };
        *side = side
            .checked_add(entry.amount)
            .ok_or_else(|| LedgerError::AmountOverflow {
                currency: entry.currency.clone(),
            })?;
    }

    Ok(totals
        .into_iter()
        .map(|(currency, (debit, credit))| CurrencyTotals {
            currency: currency.to_string(),
            debit,
            credit,
        })
        .collect())
}

/// Validates resolved entries and returns the per-currency totals.
///
/// # Errors
///
/// - `InsufficientEntries` if fewer than two entries
/// - `NegativeAmount` if any amount is below zero
/// - `SingleSided` if only one side is present
/// - `AmountOverflow` if a side total overflows
/// - `Unbalanced` if debits differ from credits in any currency
pub fn validate_entries(entries: &[ResolvedEntry]) -> Result<Vec<CurrencyTotals>, LedgerError> {
    if entries.len() < 2 {
        return Err(LedgerError::InsufficientEntries);
    }

    if let Some(entry) = entries.iter().find(|e| e.amount < Decimal::ZERO) {
        return Err(LedgerError::NegativeAmount {
            line_no: entry.line_no,
        });
    }

    let has_debit = entries.iter().any(|e| e.dc == Dc::D);
    let has_credit = entries.iter().any(|e| e.dc == Dc::C);
    if !has_debit || !has_credit {
        return Err(LedgerError::SingleSided);
    }

    let totals = currency_totals(entries)?;
    if let Some(unbalanced) = totals.iter().find(|t| !t.is_balanced()) {
        return Err(LedgerError::Unbalanced {
            currency: unbalanced.currency.clone(),
            debit: unbalanced.debit,
            credit: unbalanced.credit,
        });
    }

    Ok(totals)
}

/// Validates a posting request and returns its resolved entries.
///
/// # Errors
///
/// `MissingField` for a blank key, currency or source, then any error of
/// [`validate_entries`].
pub fn validate_input(input: &PostJournalInput) -> Result<Vec<ResolvedEntry>, LedgerError> {
    if input.idempotency_key.trim().is_empty() {
        return Err(LedgerError::MissingField("idempotency_key"));
    }
    if input.currency.trim().is_empty() {
        return Err(LedgerError::MissingField("currency"));
    }
    if input.source.trim().is_empty() {
        return Err(LedgerError::MissingField("source"));
    }

    let entries = resolve_entries(&input.currency.trim().to_uppercase(), &input.entries);
    validate_entries(&entries)?;
    Ok(entries)
}

/// Checks that an entry may be booked against `account`.
///
/// # Errors
///
/// - `AccountInactive` if the account is not ACTIVE
/// - `CurrencyMismatch` if the account is held in another currency
pub fn validate_account_usage(
    entry: &ResolvedEntry,
    account: &PostingAccount,
) -> Result<(), LedgerError> {
    if !account.is_active {
        return Err(LedgerError::AccountInactive(account.id));
    }

    if !account.currency.eq_ignore_ascii_case(&entry.currency) {
        return Err(LedgerError::CurrencyMismatch {
            account_id: account.id,
            expected: account.currency.clone(),
            actual: entry.currency.clone(),
        });
    }

    Ok(())
}
