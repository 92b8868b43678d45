//! Snapshot computation.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::ledger::{AccountType, Dc};
use crate::snapshot::error::SnapshotError;

/// Snapshot publication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    /// Working copy, recomputed in place.
    Draft,
    /// Published and immutable.
    Locked,
}

impl SnapshotStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computed figures of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFigures {
    /// Closing balance of the previous snapshot, zero for the first one.
    pub opening_balance: Decimal,
    /// Sum of debit amounts in the window.
    pub debit_total: Decimal,
    /// Sum of credit amounts in the window.
    pub credit_total: Decimal,
    /// Totals netted by the account's normal side.
    pub movement: Decimal,
    /// `opening_balance + movement`.
    pub closing_balance: Decimal,
    /// Number of entries in the window.
    pub entry_count: i64,
    /// Content digest.
    pub hash: String,
}

/// Outcome of re-checking a stored snapshot against current entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVerification {
    /// The snapshot ID.
    pub snapshot_id: Uuid,
    /// Hash stored on the snapshot.
    pub stored_hash: String,
    /// Figures recomputed now.
    pub recomputed: SnapshotFigures,
    /// True if the stored hash equals the recomputed one.
    pub matches: bool,
}

/// What an earlier snapshot already rolled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorCoverage {
    /// Start of the day after the prior snapshot's date.
    pub end: DateTime<Utc>,
    /// When the prior snapshot was last computed.
    pub computed_at: DateTime<Utc>,
}

/// Journal timestamps rolled into a snapshot.
///
/// A snapshot takes every booked entry dated on or before its date, minus
/// the entries its prior snapshot counted: those dated on or before the
/// prior date and booked no later than the prior computation. Postings made
/// on an already-snapshotted day after the computation fall into the next
/// snapshot instead of being lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotWindow {
    /// Exclusive upper bound: start of the day after `as_of_date`.
    pub end: DateTime<Utc>,
    /// Coverage of the prior snapshot, if any.
    pub prior: Option<PriorCoverage>,
}

impl SnapshotWindow {
    /// Builds the window of a snapshot as of `as_of`, following a prior
    /// snapshot dated `prior_as_of` and computed at `computed_at`.
    #[must_use]
    pub fn new(as_of: NaiveDate, prior: Option<(NaiveDate, DateTime<Utc>)>) -> Self {
        Self {
            end: day_end(as_of),
            prior: prior.map(|(date, computed_at)| PriorCoverage {
                end: day_end(date),
                computed_at,
            }),
        }
    }

    /// Returns true if an entry of a journal booked at `ts` belongs to the
    /// window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts < self.end
            && self
                .prior
                .is_none_or(|prior| ts >= prior.end || ts > prior.computed_at)
    }
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |next| next.and_time(NaiveTime::MIN).and_utc())
}

/// Stateless snapshot calculator.
pub struct SnapshotCalculator;

impl SnapshotCalculator {
    /// Rolls `entries` (side and amount) into snapshot figures.
    ///
    /// # Errors
    ///
    /// `Integrity` if a total or the closing balance overflows.
    pub fn compute(
        account_id: Uuid,
        as_of_date: NaiveDate,
        account_type: AccountType,
        opening_balance: Decimal,
        entries: impl IntoIterator<Item = (Dc, Decimal)>,
    ) -> Result<SnapshotFigures, SnapshotError> {
        let overflow = || {
            SnapshotError::Integrity(format!(
                "balance of account {account_id} as of {as_of_date} overflows"
            ))
        };

        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        let mut entry_count = 0_i64;

        for (dc, amount) in entries {
            let total = match dc {
                Dc::D => &mut debit_total,
                Dc::C => &mut credit_total,
            };
            *total = total.checked_add(amount).ok_or_else(overflow)?;
            entry_count += 1;
        }

        let movement = account_type.movement(debit_total, credit_total);
        let closing_balance = opening_balance
            .checked_add(movement)
            .ok_or_else(overflow)?;
        let hash = Self::hash(
            account_id,
            as_of_date,
            opening_balance,
            movement,
            closing_balance,
            entry_count,
        );

        Ok(SnapshotFigures {
            opening_balance,
            debit_total,
            credit_total,
            movement,
            closing_balance,
            entry_count,
            hash,
        })
    }

    /// Content digest of a snapshot. Decimals are normalized first.
    #[must_use]
    pub fn hash(
        account_id: Uuid,
        as_of_date: NaiveDate,
        opening_balance: Decimal,
        movement: Decimal,
        closing_balance: Decimal,
        entry_count: i64,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{account_id}|{as_of_date}|{}|{}|{}|{entry_count}",
            opening_balance.normalize(),
            movement.normalize(),
            closing_balance.normalize(),
        ));
        format!("{:x}", hasher.finalize())
    }

    /// Checks that a stored snapshot for the same date may be overwritten.
    ///
    /// # Errors
    ///
    /// `SnapshotLocked` if the stored row is LOCKED.
    pub fn ensure_recomputable(
        account_id: Uuid,
        as_of_date: NaiveDate,
        status: SnapshotStatus,
    ) -> Result<(), SnapshotError> {
        match status {
            SnapshotStatus::Draft => Ok(()),
            SnapshotStatus::Locked => Err(SnapshotError::SnapshotLocked {
                account_id,
                as_of_date,
            }),
        }
    }

    /// Checks the DRAFT → LOCKED publication.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the snapshot is already LOCKED.
    pub fn lock(id: Uuid, status: SnapshotStatus) -> Result<SnapshotStatus, SnapshotError> {
        match status {
            SnapshotStatus::Draft => Ok(SnapshotStatus::Locked),
            SnapshotStatus::Locked => Err(SnapshotError::InvalidState { id, status }),
        }
    }
}
