//! Idempotency record repository.
//!
//! `begin` serializes attempts on one key through a row lock held for the
//! duration of its transaction. Terminal records replay their stored
//! response verbatim until they expire.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use ledgerline_core::idempotency::{
    BeginDecision, BeginOutcome, FinishOutcome, IdempotencyError, IdempotencyPolicy,
    IdempotencyStatus as CoreIdempotencyStatus, RecordView, StoredResponse,
};
use ledgerline_shared::Clock;

use crate::entities::{idempotency_records, sea_orm_active_enums::IdempotencyStatus};
use crate::error::{db_err, is_unique_violation};

/// Repository for idempotency records.
#[derive(Debug, Clone)]
pub struct IdempotencyRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    policy: IdempotencyPolicy,
}

impl IdempotencyRepository {
    /// Creates a new idempotency repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        policy: IdempotencyPolicy,
    ) -> Self {
        Self { db, clock, policy }
    }

    /// Starts an attempt for `key`.
    ///
    /// # Errors
    ///
    /// - `MissingKey` if the key is blank
    /// - `KeyReuseConflict` if the key was used with another request hash
    /// - `AlreadyInProgress` if a fresh attempt holds the key
    pub async fn begin(
        &self,
        key: &str,
        request_hash: &str,
    ) -> Result<BeginOutcome, IdempotencyError> {
        let now = self.clock.now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = idempotency_records::Entity::find_by_id(key.to_string())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?;
        let view = existing.as_ref().map(record_view).transpose()?;

        let decision = self
            .policy
            .decide_begin(key, view.as_ref(), request_hash, now)
            .inspect_err(|e| warn!(idempotency_key = %key, error = %e, "Idempotent begin refused"))?;

        match (decision, existing) {
            (BeginDecision::Replay(response), _) => {
                txn.commit().await.map_err(db_err)?;
                debug!(idempotency_key = %key, status_code = response.status_code, "Replaying stored response");
                return Ok(BeginOutcome::Replay(response));
            }
            (BeginDecision::Insert, _) | (_, None) => {
                let record = idempotency_records::ActiveModel {
                    idempotency_key: Set(key.to_string()),
                    request_hash: Set(request_hash.to_string()),
                    status: Set(IdempotencyStatus::InProgress),
                    response_status: Set(None),
                    response_body: Set(None),
                    locked_at: Set(now),
                    expires_at: Set(self.policy.expires_at(now)),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                record.insert(&txn).await.map_err(|e| {
                    if is_unique_violation(&e) {
                        IdempotencyError::AlreadyInProgress(key.to_string())
                    } else {
                        db_err(e)
                    }
                })?;
            }
            (BeginDecision::Reset, Some(record)) => {
                let mut active: idempotency_records::ActiveModel = record.into();
                active.request_hash = Set(request_hash.to_string());
                active.status = Set(IdempotencyStatus::InProgress);
                active.response_status = Set(None);
                active.response_body = Set(None);
                active.locked_at = Set(now);
                active.expires_at = Set(self.policy.expires_at(now));
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(db_err)?;
                debug!(idempotency_key = %key, "Expired idempotency record reset");
            }
            (BeginDecision::TakeOver, Some(record)) => {
                let mut active: idempotency_records::ActiveModel = record.into();
                active.locked_at = Set(now);
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(db_err)?;
                warn!(idempotency_key = %key, "Stale in-progress attempt taken over");
            }
        }

        txn.commit().await.map_err(db_err)?;
        Ok(BeginOutcome::Proceed)
    }

    /// Records the outcome of an attempt.
    ///
    /// Responses below 400 complete the record and 4xx responses fail it;
    /// both are replayed from then on. A 5xx response deletes the record so
    /// the request can be attempted again.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if no record exists for the key
    /// - `InvalidState` unless the record is IN_PROGRESS
    pub async fn finish(
        &self,
        key: &str,
        status_code: u16,
        body: &str,
    ) -> Result<FinishOutcome, IdempotencyError> {
        let now = self.clock.now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let record = idempotency_records::Entity::find_by_id(key.to_string())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| IdempotencyError::RecordNotFound(key.to_string()))?;

        IdempotencyPolicy::ensure_finishable(key, record.status.into())?;

        let outcome = FinishOutcome::for_status(status_code);
        match outcome.stored_status() {
            Some(status) => {
                let mut active: idempotency_records::ActiveModel = record.into();
                active.status = Set(status.into());
                active.response_status = Set(Some(i32::from(status_code)));
                active.response_body = Set(Some(body.to_string()));
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(db_err)?;
            }
            None => {
                record.delete(&txn).await.map_err(db_err)?;
            }
        }

        txn.commit().await.map_err(db_err)?;

        info!(idempotency_key = %key, status_code, outcome = ?outcome, "Idempotent request finished");
        Ok(outcome)
    }

    /// Deletes expired terminal records and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn purge_expired(&self) -> Result<u64, IdempotencyError> {
        let result = idempotency_records::Entity::delete_many()
            .filter(idempotency_records::Column::ExpiresAt.lte(self.clock.now()))
            .filter(
                idempotency_records::Column::Status
                    .is_in([IdempotencyStatus::Completed, IdempotencyStatus::Failed]),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected > 0 {
            info!(purged = result.rows_affected, "Expired idempotency records purged");
        }
        Ok(result.rows_affected)
    }

    /// Finds the record of a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        key: &str,
    ) -> Result<Option<idempotency_records::Model>, IdempotencyError> {
        idempotency_records::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

fn record_view(record: &idempotency_records::Model) -> Result<RecordView, IdempotencyError> {
    let response = match (record.response_status, &record.response_body) {
        (Some(status), Some(body)) => {
            let status_code = u16::try_from(status).map_err(|_| {
                IdempotencyError::Integrity(format!(
                    "record '{}' stores status {status}",
                    record.idempotency_key
                ))
            })?;
            Some(StoredResponse::new(status_code, body.clone()))
        }
        _ => None,
    };

    Ok(RecordView {
        status: CoreIdempotencyStatus::from(record.status),
        request_hash: record.request_hash.clone(),
        locked_at: record.locked_at,
        expires_at: record.expires_at,
        response,
    })
}
