//! Ledger domain types for journal posting.
//!
//! This module defines the core types used for submitting, validating and
//! reversing journals in the double-entry ledger.

use std::fmt;

use ledgerline_shared::Holder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of an entry.
///
/// The amount of an entry is never negative; the side carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dc {
    /// Debit.
    D,
    /// Credit.
    C,
}

impl Dc {
    /// Returns the string representation of the side.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D => "D",
            Self::C => "C",
        }
    }

    /// Parses a side from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "D" | "d" => Some(Self::D),
            "C" | "c" => Some(Self::C),
            _ => None,
        }
    }

    /// Returns the opposite side.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::D => Self::C,
            Self::C => Self::D,
        }
    }
}

impl fmt::Display for Dc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Journal lifecycle status.
///
/// Valid transitions:
/// - Draft → Posted (post)
/// - Posted → Reversed (a reversal journal was booked against it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalStatus {
    /// Created, entries being written.
    Draft,
    /// Booked.
    Posted,
    /// Booked and offset by a reversal journal.
    Reversed,
}

impl JournalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Reversed => "REVERSED",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "POSTED" => Some(Self::Posted),
            "REVERSED" => Some(Self::Reversed),
            _ => None,
        }
    }

    /// Returns true if entries of journals in this status count toward balances.
    #[must_use]
    pub const fn is_booked(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }

    /// Returns true if moving from `self` to `to` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Posted) | (Self::Posted, Self::Reversed)
        )
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed entry of a journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInput {
    /// Account to book against.
    pub account_id: Uuid,
    /// Debit or credit.
    pub dc: Dc,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Entry currency, defaults to the journal currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Optional memo.
    #[serde(default)]
    pub memo: Option<String>,
}

impl EntryInput {
    /// Creates a debit entry.
    #[must_use]
    pub const fn debit(account_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            dc: Dc::D,
            amount,
            currency: None,
            memo: None,
        }
    }

    /// Creates a credit entry.
    #[must_use]
    pub const fn credit(account_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            dc: Dc::C,
            amount,
            currency: None,
            memo: None,
        }
    }
}

/// Input for posting a journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostJournalInput {
    /// Caller-chosen key; the same key always denotes the same journal.
    pub idempotency_key: String,
    /// Journal currency.
    pub currency: String,
    /// Originating channel (e.g. `API`).
    pub source: String,
    /// Entries in caller order.
    pub entries: Vec<EntryInput>,
    /// Identity posting the journal.
    pub posted_by: Holder,
}

/// An entry after defaults were applied and a line number assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    /// 1-based position within the journal.
    pub line_no: i32,
    /// Account to book against.
    pub account_id: Uuid,
    /// Debit or credit.
    pub dc: Dc,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Entry currency.
    pub currency: String,
    /// Optional memo.
    pub memo: Option<String>,
}

/// Account facts needed to accept an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingAccount {
    /// Account ID.
    pub id: Uuid,
    /// Account currency.
    pub currency: String,
    /// Whether the account is ACTIVE.
    pub is_active: bool,
}

/// Per-currency debit and credit totals of a journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    /// Currency code.
    pub currency: String,
    /// Sum of debit amounts.
    pub debit: Decimal,
    /// Sum of credit amounts.
    pub credit: Decimal,
}

impl CurrencyTotals {
    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}
