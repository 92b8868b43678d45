//! Outbox repository.
//!
//! Rows of `transaction_logs` are appended in the same transaction as the
//! state change they announce, and later delivered by the
//! [`OutboxDispatcher`](crate::dispatcher::OutboxDispatcher).
//!
//! Delivery is ordered per partition: only the lowest undelivered `sequence`
//! of a partition is ever handed out, so a failing event holds back the
//! events queued behind it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use ledgerline_core::outbox::{
    OutboxError, OutboxStatus as CoreOutboxStatus, RetryDecision, RetryPolicy, event_key,
};
use ledgerline_shared::Clock;

use crate::entities::{sea_orm_active_enums::OutboxStatus, transaction_logs};
use crate::error::{db_err, is_unique_violation};

/// Event to append to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxEvent {
    /// Kind of the source aggregate (e.g. `journal`).
    pub aggregate_type: String,
    /// Id of the source aggregate.
    pub aggregate_id: String,
    /// Event name (e.g. `journal.posted`).
    pub event_type: String,
    /// Opaque payload text.
    pub payload: String,
    /// Events sharing a partition are delivered in enqueue order.
    pub partition_key: String,
}

impl NewOutboxEvent {
    /// Creates an event with a JSON payload.
    #[must_use]
    pub fn new(
        aggregate_type: &str,
        aggregate_id: impl ToString,
        event_type: &str,
        payload: &serde_json::Value,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.to_string(),
            aggregate_id: aggregate_id.to_string(),
            event_type: event_type.to_string(),
            payload: payload.to_string(),
            partition_key: partition_key.into(),
        }
    }

    /// Returns the dedupe key of this event.
    #[must_use]
    pub fn event_key(&self) -> String {
        event_key(&self.aggregate_type, &self.aggregate_id, &self.event_type)
    }

    fn validate(&self) -> Result<(), OutboxError> {
        let fields = [
            ("aggregate_type", &self.aggregate_type),
            ("aggregate_id", &self.aggregate_id),
            ("event_type", &self.event_type),
            ("partition_key", &self.partition_key),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(OutboxError::MissingField(*field)),
            None => Ok(()),
        }
    }
}

/// Rounds of read-then-insert before a racing append gives up.
const APPEND_ATTEMPTS: u32 = 3;

/// Appends `event` on `conn`, which may be the caller's transaction.
///
/// An event whose key already exists is not appended again; the existing
/// row is returned. A concurrent append that wins the key or the partition
/// sequence first is detected through the unique indexes and the round is
/// retried.
pub(crate) async fn append<C>(
    conn: &C,
    event: &NewOutboxEvent,
    now: DateTime<Utc>,
) -> Result<transaction_logs::Model, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let key = event.event_key();
    let mut attempt = 1;

    loop {
        if let Some(existing) = transaction_logs::Entity::find()
            .filter(transaction_logs::Column::EventKey.eq(key.as_str()))
            .one(conn)
            .await?
        {
            debug!(event_key = %key, "Outbox event already enqueued");
            return Ok(existing);
        }

        let last = transaction_logs::Entity::find()
            .filter(transaction_logs::Column::PartitionKey.eq(event.partition_key.as_str()))
            .order_by_desc(transaction_logs::Column::Sequence)
            .one(conn)
            .await?;
        let sequence = last.map_or(1, |row| row.sequence + 1);

        match insert_in_savepoint(conn, event, &key, sequence, now).await {
            Ok(row) => {
                debug!(
                    event_key = %row.event_key,
                    partition = %row.partition_key,
                    sequence = row.sequence,
                    "Outbox event enqueued"
                );
                return Ok(row);
            }
            Err(err) if is_unique_violation(&err) && attempt < APPEND_ATTEMPTS => {
                debug!(event_key = %key, sequence, attempt, "Outbox append raced, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Inserts the row inside a savepoint so a constraint violation leaves the
/// surrounding transaction usable.
async fn insert_in_savepoint<C>(
    conn: &C,
    event: &NewOutboxEvent,
    key: &str,
    sequence: i64,
    now: DateTime<Utc>,
) -> Result<transaction_logs::Model, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let savepoint = conn.begin().await?;

    let row = transaction_logs::ActiveModel {
        id: Set(Uuid::now_v7()),
        aggregate_type: Set(event.aggregate_type.clone()),
        aggregate_id: Set(event.aggregate_id.clone()),
        event_type: Set(event.event_type.clone()),
        event_key: Set(key.to_string()),
        payload: Set(event.payload.clone()),
        status: Set(OutboxStatus::Pending),
        attempts: Set(0),
        next_attempt_at: Set(now),
        partition_key: Set(event.partition_key.clone()),
        sequence: Set(sequence),
        last_error: Set(None),
        published_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match row.insert(&savepoint).await {
        Ok(row) => {
            savepoint.commit().await?;
            Ok(row)
        }
        Err(err) => {
            savepoint.rollback().await?;
            Err(err)
        }
    }
}

/// Repository for the outbox.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl OutboxRepository {
    /// Creates a new outbox repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self { db, clock, policy }
    }

    /// Returns the retry policy used by [`Self::mark_failed`].
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Enqueues an event as PENDING, due now.
    ///
    /// # Errors
    ///
    /// `MissingField` if an identifying field is blank.
    pub async fn enqueue(
        &self,
        event: &NewOutboxEvent,
    ) -> Result<transaction_logs::Model, OutboxError> {
        event.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let row = append(&txn, event, self.clock.now())
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        Ok(row)
    }

    /// Gets an event by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event does not exist.
    pub async fn get(&self, id: Uuid) -> Result<transaction_logs::Model, OutboxError> {
        transaction_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(OutboxError::NotFound(id))
    }

    /// Lists the events of a partition in sequence order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_partition(
        &self,
        partition_key: &str,
    ) -> Result<Vec<transaction_logs::Model>, OutboxError> {
        transaction_logs::Entity::find()
            .filter(transaction_logs::Column::PartitionKey.eq(partition_key))
            .order_by_asc(transaction_logs::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Returns the deliverable events that are due.
    ///
    /// Only the head (lowest sequence) of each partition's PENDING/FAILED
    /// events is considered; it is returned when its `next_attempt_at` has
    /// passed. Results are ordered by `next_attempt_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn claim_due(&self, limit: u64) -> Result<Vec<transaction_logs::Model>, OutboxError> {
        let now = self.clock.now();

        let undelivered = transaction_logs::Entity::find()
            .filter(
                transaction_logs::Column::Status.is_in([OutboxStatus::Pending, OutboxStatus::Failed]),
            )
            .order_by_asc(transaction_logs::Column::PartitionKey)
            .order_by_asc(transaction_logs::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut heads: BTreeMap<String, transaction_logs::Model> = BTreeMap::new();
        for row in undelivered {
            heads.entry(row.partition_key.clone()).or_insert(row);
        }

        let mut due: Vec<_> = heads
            .into_values()
            .filter(|row| row.next_attempt_at <= now)
            .collect();
        due.sort_by(|a, b| {
            a.next_attempt_at
                .cmp(&b.next_attempt_at)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        due.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(due)
    }

    /// Marks an event as delivered.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `InvalidState` unless the event is PENDING or FAILED
    pub async fn mark_published(&self, id: Uuid) -> Result<transaction_logs::Model, OutboxError> {
        let row = self.deliverable(id).await?;
        let now = self.clock.now();

        let mut active: transaction_logs::ActiveModel = row.into();
        active.status = Set(OutboxStatus::Published);
        active.published_at = Set(Some(now));
        active.updated_at = Set(now);

        let row = active.update(&self.db).await.map_err(db_err)?;
        info!(event_key = %row.event_key, attempts = row.attempts, "Outbox event published");
        Ok(row)
    }

    /// Records a failed delivery.
    ///
    /// The attempt counter is incremented and the next attempt is scheduled
    /// with exponential backoff; once the counter reaches the configured
    /// ceiling the event is DEAD.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `InvalidState` unless the event is PENDING or FAILED
    pub async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
    ) -> Result<transaction_logs::Model, OutboxError> {
        let row = self.deliverable(id).await?;
        let now = self.clock.now();
        let attempts = row.attempts.saturating_add(1);

        let mut active: transaction_logs::ActiveModel = row.into();
        active.attempts = Set(attempts);
        active.last_error = Set(Some(error.to_string()));
        active.updated_at = Set(now);

        match self.policy.decide(u32::try_from(attempts).unwrap_or(u32::MAX)) {
            RetryDecision::Retry { delay } => {
                active.status = Set(OutboxStatus::Failed);
                active.next_attempt_at = Set(now.checked_add_signed(delay).unwrap_or(now));
            }
            RetryDecision::Dead => {
                active.status = Set(OutboxStatus::Dead);
            }
        }

        let row = active.update(&self.db).await.map_err(db_err)?;
        if row.status == OutboxStatus::Dead {
            warn!(event_key = %row.event_key, attempts, error, "Outbox event dead-lettered");
        } else {
            warn!(
                event_key = %row.event_key,
                attempts,
                next_attempt_at = %row.next_attempt_at,
                error,
                "Outbox delivery failed, retry scheduled"
            );
        }
        Ok(row)
    }

    async fn deliverable(&self, id: Uuid) -> Result<transaction_logs::Model, OutboxError> {
        let row = self.get(id).await?;
        let status = CoreOutboxStatus::from(row.status);
        if status.is_deliverable() {
            Ok(row)
        } else {
            Err(OutboxError::InvalidState { id, status })
        }
    }
}
