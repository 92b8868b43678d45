//! Snapshot repository.
//!
//! A snapshot rolls an account's booked entries up to a date, starting from
//! the closing balance of the latest earlier snapshot. DRAFT snapshots can be
//! recomputed in place; LOCKED ones are final.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use ledgerline_core::ledger::{AccountType, Dc, JournalStatus as CoreJournalStatus};
use ledgerline_core::snapshot::{
    SnapshotCalculator, SnapshotError, SnapshotFigures, SnapshotStatus as CoreSnapshotStatus,
    SnapshotVerification, SnapshotWindow,
};
use ledgerline_shared::Clock;

use crate::entities::{
    coa_accounts, entries, journals,
    sea_orm_active_enums::{JournalStatus, SnapshotStatus},
    snapshots,
};
use crate::error::db_err;

/// Repository for account snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SnapshotRepository {
    /// Creates a new snapshot repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Computes (or recomputes) the DRAFT snapshot of an account as of a date.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account does not exist
    /// - `SnapshotLocked` if a LOCKED snapshot exists for the date
    pub async fn compute_snapshot(
        &self,
        account_id: Uuid,
        as_of_date: NaiveDate,
    ) -> Result<snapshots::Model, SnapshotError> {
        let now = self.clock.now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let account = coa_accounts::Entity::find_by_id(account_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(SnapshotError::AccountNotFound(account_id))?;

        let existing = snapshots::Entity::find()
            .filter(snapshots::Column::AccountId.eq(account_id))
            .filter(snapshots::Column::AsOfDate.eq(as_of_date))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?;

        if let Some(existing) = &existing {
            SnapshotCalculator::ensure_recomputable(account_id, as_of_date, existing.status.into())
                .inspect_err(|_| {
                    warn!(account_id = %account_id, as_of_date = %as_of_date, "Snapshot is locked");
                })?;
        }

        let figures = figures(&txn, account_id, account.account_type.into(), as_of_date).await?;

        let snapshot = match existing {
            Some(existing) => {
                let mut active: snapshots::ActiveModel = existing.into();
                active.opening_balance = Set(figures.opening_balance);
                active.debit_total = Set(figures.debit_total);
                active.credit_total = Set(figures.credit_total);
                active.movement = Set(figures.movement);
                active.closing_balance = Set(figures.closing_balance);
                active.entry_count = Set(figures.entry_count);
                active.hash = Set(figures.hash.clone());
                active.computed_at = Set(now);
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(db_err)?
            }
            None => snapshots::ActiveModel {
                id: Set(Uuid::now_v7()),
                account_id: Set(account_id),
                as_of_date: Set(as_of_date),
                opening_balance: Set(figures.opening_balance),
                debit_total: Set(figures.debit_total),
                credit_total: Set(figures.credit_total),
                movement: Set(figures.movement),
                closing_balance: Set(figures.closing_balance),
                entry_count: Set(figures.entry_count),
                hash: Set(figures.hash.clone()),
                status: Set(SnapshotStatus::Draft),
                computed_at: Set(now),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?,
        };

        txn.commit().await.map_err(db_err)?;

        info!(
            snapshot_id = %snapshot.id,
            account_id = %account_id,
            as_of_date = %as_of_date,
            closing_balance = %snapshot.closing_balance,
            entry_count = snapshot.entry_count,
            "Snapshot computed"
        );
        Ok(snapshot)
    }

    /// Publishes a DRAFT snapshot as LOCKED.
    ///
    /// # Errors
    ///
    /// - `SnapshotNotFound` if the snapshot does not exist
    /// - `InvalidState` if it is already LOCKED
    pub async fn lock_snapshot(&self, snapshot_id: Uuid) -> Result<snapshots::Model, SnapshotError> {
        let snapshot = self.get_snapshot(snapshot_id).await?;
        let status = SnapshotCalculator::lock(snapshot_id, snapshot.status.into())?;

        let mut active: snapshots::ActiveModel = snapshot.into();
        active.status = Set(status.into());
        active.updated_at = Set(self.clock.now());

        let snapshot = active.update(&self.db).await.map_err(db_err)?;
        info!(snapshot_id = %snapshot_id, hash = %snapshot.hash, "Snapshot locked");
        Ok(snapshot)
    }

    /// Recomputes a snapshot over the current entries and compares hashes.
    ///
    /// Nothing is written.
    ///
    /// # Errors
    ///
    /// `SnapshotNotFound` / `AccountNotFound` if either row is missing.
    pub async fn verify_snapshot(
        &self,
        snapshot_id: Uuid,
    ) -> Result<SnapshotVerification, SnapshotError> {
        let snapshot = self.get_snapshot(snapshot_id).await?;
        let account = coa_accounts::Entity::find_by_id(snapshot.account_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(SnapshotError::AccountNotFound(snapshot.account_id))?;

        let recomputed = figures(
            &self.db,
            snapshot.account_id,
            account.account_type.into(),
            snapshot.as_of_date,
        )
        .await?;
        let matches = recomputed.hash == snapshot.hash;

        if !matches {
            warn!(
                snapshot_id = %snapshot_id,
                stored = %snapshot.hash,
                recomputed = %recomputed.hash,
                status = %CoreSnapshotStatus::from(snapshot.status),
                "Snapshot diverged from entries"
            );
        }

        Ok(SnapshotVerification {
            snapshot_id,
            stored_hash: snapshot.hash,
            recomputed,
            matches,
        })
    }

    /// Gets a snapshot by id.
    ///
    /// # Errors
    ///
    /// `SnapshotNotFound` if the snapshot does not exist.
    pub async fn get_snapshot(&self, snapshot_id: Uuid) -> Result<snapshots::Model, SnapshotError> {
        snapshots::Entity::find_by_id(snapshot_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(SnapshotError::SnapshotNotFound(snapshot_id))
    }

    /// Lists an account's snapshots by date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_snapshots(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<snapshots::Model>, SnapshotError> {
        snapshots::Entity::find()
            .filter(snapshots::Column::AccountId.eq(account_id))
            .order_by_asc(snapshots::Column::AsOfDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

/// Computes the figures of `account_id` as of `as_of_date` from the prior
/// snapshot and the booked entries of the window.
async fn figures<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    account_type: AccountType,
    as_of_date: NaiveDate,
) -> Result<SnapshotFigures, SnapshotError> {
    let prior = snapshots::Entity::find()
        .filter(snapshots::Column::AccountId.eq(account_id))
        .filter(snapshots::Column::AsOfDate.lt(as_of_date))
        .order_by_desc(snapshots::Column::AsOfDate)
        .one(conn)
        .await
        .map_err(db_err)?;

    let window = SnapshotWindow::new(
        as_of_date,
        prior.as_ref().map(|p| (p.as_of_date, p.computed_at)),
    );
    let opening = prior.map_or(Decimal::ZERO, |p| p.closing_balance);

    let mut query = entries::Entity::find()
        .find_also_related(journals::Entity)
        .filter(entries::Column::AccountId.eq(account_id))
        .filter(journals::Column::Status.is_in([JournalStatus::Posted, JournalStatus::Reversed]))
        .filter(journals::Column::Ts.lt(window.end));
    if let Some(prior) = window.prior {
        query = query.filter(
            Condition::any()
                .add(journals::Column::Ts.gte(prior.end))
                .add(journals::Column::Ts.gt(prior.computed_at)),
        );
    }
    let rows = query.all(conn).await.map_err(db_err)?;

    let mut movements: Vec<(Dc, Decimal)> = Vec::with_capacity(rows.len());
    for (entry, journal) in rows {
        let journal = journal.ok_or_else(|| {
            SnapshotError::Integrity(format!("entry {} has no journal", entry.id))
        })?;
        let booked = CoreJournalStatus::from(journal.status).is_booked();
        if booked && window.contains(journal.ts) {
            movements.push((entry.dc.into(), entry.amount));
        }
    }

    SnapshotCalculator::compute(account_id, as_of_date, account_type, opening, movements)
}
