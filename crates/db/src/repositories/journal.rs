//! Journal repository: posting and reversal.
//!
//! Posting is idempotent on the caller's key. The journal is inserted as
//! DRAFT with its entries, then moved to POSTED by a compare-and-set on
//! `lock_version`, and a `journal.posted` outbox event is appended, all in
//! one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ledgerline_core::ledger::{
    JournalStatus as CoreJournalStatus, LedgerError, PostJournalInput, PostingAccount,
    ResolvedEntry, ReversalService, request_hash, validate_account_usage, validate_entries,
    validate_input,
};
use ledgerline_shared::{Clock, Holder};

use crate::entities::{
    coa_accounts, entries, journals,
    sea_orm_active_enums::{AccountStatus, JournalStatus},
};
use crate::error::{db_err, is_unique_violation};
use crate::repositories::outbox::{NewOutboxEvent, append};

/// Event emitted when a journal is posted.
pub const JOURNAL_POSTED_EVENT: &str = "journal.posted";
/// Event emitted on the original journal when it is reversed.
pub const JOURNAL_REVERSED_EVENT: &str = "journal.reversed";

/// Source recorded on reversal journals.
const REVERSAL_SOURCE: &str = "REVERSAL";

/// A journal with its entries in `line_no` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalWithEntries {
    /// The journal row.
    pub journal: journals::Model,
    /// Its entries.
    pub entries: Vec<entries::Model>,
}

/// Repository for journals and entries.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Posts a journal.
    ///
    /// Repeating a key with the identical payload returns the stored journal
    /// and writes nothing.
    ///
    /// # Errors
    ///
    /// - Validation errors of the input, before anything is written
    /// - `AccountNotFound` / `AccountInactive` / `CurrencyMismatch`
    /// - `DuplicateSubmission` if the key was used for a different payload
    /// - `StaleWrite` if the journal changed between insert and posting
    pub async fn post_journal(
        &self,
        input: &PostJournalInput,
    ) -> Result<JournalWithEntries, LedgerError> {
        let entries = validate_input(input)?;
        let key = input.idempotency_key.trim();
        let currency = input.currency.trim().to_uppercase();
        let source = input.source.trim();
        let hash = request_hash(&currency, source, &entries);

        if let Some(existing) = self.find_by_idempotency_key(key).await? {
            return self.replay(existing, key, &hash).await;
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        check_accounts(&txn, &entries).await?;

        let now = self.clock.now();
        let draft = NewJournal {
            key,
            hash: &hash,
            currency: &currency,
            source,
            reversal_of_id: None,
        };

        let journal = match insert_draft(&txn, &draft, now).await {
            Ok(journal) => journal,
            Err(e) if is_unique_violation(&e) => {
                // Lost the race on the idempotency key; the winner decides.
                txn.rollback().await.map_err(db_err)?;
                let winner = self
                    .find_by_idempotency_key(key)
                    .await?
                    .ok_or_else(|| LedgerError::Database(e.to_string()))?;
                return self.replay(winner, key, &hash).await;
            }
            Err(e) => return Err(db_err(e)),
        };

        let rows = insert_entries(&txn, journal.id, &entries, now).await?;
        let journal = transition(
            &txn,
            &journal,
            CoreJournalStatus::Posted,
            Some(&input.posted_by),
            now,
        )
        .await?;

        append(&txn, &posted_event(&journal, &rows), now)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            journal_id = %journal.id,
            idempotency_key = %journal.idempotency_key,
            currency = %journal.currency,
            entries = rows.len(),
            posted_by = %input.posted_by,
            "Journal posted"
        );

        Ok(JournalWithEntries {
            journal,
            entries: rows,
        })
    }

    /// Reverses a POSTED journal.
    ///
    /// The reversal mirrors the original's entries with debit and credit
    /// swapped and is keyed `reversal:<original id>`. The original moves to
    /// REVERSED in the same transaction.
    ///
    /// # Errors
    ///
    /// - `JournalNotFound` if the journal does not exist
    /// - `InvalidState` unless the journal is POSTED
    /// - `StaleWrite` if the original changed concurrently
    pub async fn reverse_journal(
        &self,
        journal_id: Uuid,
        actor: &Holder,
    ) -> Result<JournalWithEntries, LedgerError> {
        let now = self.clock.now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let original = journals::Entity::find_by_id(journal_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::JournalNotFound(journal_id))?;

        ReversalService::ensure_reversible(journal_id, original.status.into())?;

        let original_entries = load_entries(&txn, journal_id).await?;
        let resolved: Vec<ResolvedEntry> = original_entries.iter().map(resolved_entry).collect();
        let mirrored = ReversalService::reverse_entries(&resolved);
        validate_entries(&mirrored).map_err(|e| {
            LedgerError::Integrity(format!("stored journal {journal_id} does not reverse: {e}"))
        })?;

        let key = ReversalService::reversal_key(journal_id);
        let hash = request_hash(&original.currency, REVERSAL_SOURCE, &mirrored);
        let draft = NewJournal {
            key: &key,
            hash: &hash,
            currency: &original.currency,
            source: REVERSAL_SOURCE,
            reversal_of_id: Some(journal_id),
        };

        let reversal = insert_draft(&txn, &draft, now).await.map_err(db_err)?;
        let rows = insert_entries(&txn, reversal.id, &mirrored, now).await?;
        let reversal =
            transition(&txn, &reversal, CoreJournalStatus::Posted, Some(actor), now).await?;
        let original =
            transition(&txn, &original, CoreJournalStatus::Reversed, None, now).await?;

        append(&txn, &posted_event(&reversal, &rows), now)
            .await
            .map_err(db_err)?;
        append(
            &txn,
            &NewOutboxEvent::new(
                "journal",
                original.id,
                JOURNAL_REVERSED_EVENT,
                &json!({
                    "journal_id": original.id,
                    "reversal_id": reversal.id,
                    "reversed_by": actor.to_string(),
                }),
                partition(original.id),
            ),
            now,
        )
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            journal_id = %journal_id,
            reversal_id = %reversal.id,
            actor = %actor,
            "Journal reversed"
        );

        Ok(JournalWithEntries {
            journal: reversal,
            entries: rows,
        })
    }

    /// Gets a journal with its entries.
    ///
    /// # Errors
    ///
    /// `JournalNotFound` if the journal does not exist.
    pub async fn get_journal(&self, journal_id: Uuid) -> Result<JournalWithEntries, LedgerError> {
        let journal = journals::Entity::find_by_id(journal_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::JournalNotFound(journal_id))?;
        let entries = load_entries(&self.db, journal_id).await?;

        Ok(JournalWithEntries { journal, entries })
    }

    /// Finds a journal by idempotency key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<journals::Model>, LedgerError> {
        journals::Entity::find()
            .filter(journals::Column::IdempotencyKey.eq(key.trim()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Returns the stored journal for a repeated key, or `DuplicateSubmission`
    /// if the payload differs.
    async fn replay(
        &self,
        existing: journals::Model,
        key: &str,
        hash: &str,
    ) -> Result<JournalWithEntries, LedgerError> {
        if existing.request_hash != hash {
            warn!(idempotency_key = %key, journal_id = %existing.id, "Idempotency key reused with a different payload");
            return Err(LedgerError::DuplicateSubmission(key.to_string()));
        }

        debug!(idempotency_key = %key, journal_id = %existing.id, "Journal replayed");
        let entries = load_entries(&self.db, existing.id).await?;
        Ok(JournalWithEntries {
            journal: existing,
            entries,
        })
    }
}

struct NewJournal<'a> {
    key: &'a str,
    hash: &'a str,
    currency: &'a str,
    source: &'a str,
    reversal_of_id: Option<Uuid>,
}

async fn insert_draft(
    txn: &DatabaseTransaction,
    draft: &NewJournal<'_>,
    now: DateTime<Utc>,
) -> Result<journals::Model, sea_orm::DbErr> {
    journals::ActiveModel {
        id: Set(Uuid::now_v7()),
        idempotency_key: Set(draft.key.to_string()),
        request_hash: Set(draft.hash.to_string()),
        status: Set(JournalStatus::Draft),
        currency: Set(draft.currency.to_string()),
        source: Set(draft.source.to_string()),
        ts: Set(now),
        posted_at: Set(None),
        posted_by: Set(None),
        reversal_of_id: Set(draft.reversal_of_id),
        lock_version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await
}

async fn insert_entries(
    txn: &DatabaseTransaction,
    journal_id: Uuid,
    resolved: &[ResolvedEntry],
    now: DateTime<Utc>,
) -> Result<Vec<entries::Model>, LedgerError> {
    let mut rows = Vec::with_capacity(resolved.len());

    for entry in resolved {
        let row = entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            journal_id: Set(journal_id),
            line_no: Set(entry.line_no),
            account_id: Set(entry.account_id),
            dc: Set(entry.dc.into()),
            amount: Set(entry.amount),
            currency: Set(entry.currency.clone()),
            memo: Set(entry.memo.clone()),
            created_at: Set(now),
        };
        rows.push(row.insert(txn).await.map_err(db_err)?);
    }

    Ok(rows)
}

/// Checks every referenced account once.
async fn check_accounts(
    txn: &DatabaseTransaction,
    resolved: &[ResolvedEntry],
) -> Result<(), LedgerError> {
    let mut accounts: HashMap<Uuid, PostingAccount> = HashMap::new();

    for entry in resolved {
        if !accounts.contains_key(&entry.account_id) {
            let account = coa_accounts::Entity::find_by_id(entry.account_id)
                .one(txn)
                .await
                .map_err(db_err)?
                .ok_or(LedgerError::AccountNotFound(entry.account_id))?;
            accounts.insert(
                account.id,
                PostingAccount {
                    id: account.id,
                    currency: account.currency,
                    is_active: account.status == AccountStatus::Active,
                },
            );
        }

        if let Some(account) = accounts.get(&entry.account_id) {
            validate_account_usage(entry, account)?;
        }
    }

    Ok(())
}

/// Moves a journal to `to` with a compare-and-set on `lock_version`.
async fn transition<C: ConnectionTrait>(
    conn: &C,
    journal: &journals::Model,
    to: CoreJournalStatus,
    posted_by: Option<&Holder>,
    now: DateTime<Utc>,
) -> Result<journals::Model, LedgerError> {
    let from = CoreJournalStatus::from(journal.status);
    if !from.can_transition_to(to) {
        return Err(LedgerError::InvalidState {
            id: journal.id,
            from,
            to,
        });
    }

    let mut active = journals::ActiveModel {
        status: Set(to.into()),
        lock_version: Set(journal.lock_version + 1),
        updated_at: Set(now),
        ..Default::default()
    };
    if to == CoreJournalStatus::Posted {
        active.posted_at = Set(Some(now));
        active.posted_by = Set(posted_by.map(ToString::to_string));
    }

    let result = journals::Entity::update_many()
        .set(active)
        .filter(journals::Column::Id.eq(journal.id))
        .filter(journals::Column::LockVersion.eq(journal.lock_version))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        warn!(journal_id = %journal.id, expected = journal.lock_version, "Stale journal write");
        return Err(LedgerError::StaleWrite {
            id: journal.id,
            expected: journal.lock_version,
        });
    }

    journals::Entity::find_by_id(journal.id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::Integrity(format!("journal {} vanished", journal.id)))
}

async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    journal_id: Uuid,
) -> Result<Vec<entries::Model>, LedgerError> {
    entries::Entity::find()
        .filter(entries::Column::JournalId.eq(journal_id))
        .order_by_asc(entries::Column::LineNo)
        .all(conn)
        .await
        .map_err(db_err)
}

fn resolved_entry(row: &entries::Model) -> ResolvedEntry {
    ResolvedEntry {
        line_no: row.line_no,
        account_id: row.account_id,
        dc: row.dc.into(),
        amount: row.amount,
        currency: row.currency.clone(),
        memo: row.memo.clone(),
    }
}

fn partition(journal_id: Uuid) -> String {
    format!("journal:{journal_id}")
}

fn posted_event(journal: &journals::Model, rows: &[entries::Model]) -> NewOutboxEvent {
    let lines: Vec<_> = rows
        .iter()
        .map(|e| {
            json!({
                "line_no": e.line_no,
                "account_id": e.account_id,
                "dc": e.dc,
                "amount": e.amount,
                "currency": e.currency,
            })
        })
        .collect();

    NewOutboxEvent::new(
        "journal",
        journal.id,
        JOURNAL_POSTED_EVENT,
        &json!({
            "journal_id": journal.id,
            "idempotency_key": journal.idempotency_key,
            "currency": journal.currency,
            "source": journal.source,
            "reversal_of_id": journal.reversal_of_id,
            "posted_by": journal.posted_by,
            "entries": lines,
        }),
        partition(journal.id),
    )
}
