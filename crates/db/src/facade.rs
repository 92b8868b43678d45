//! `AccountingCore`: the boundary functions of the accounting core.
//!
//! Every repository gets the same connection pool and clock. There is no
//! process-wide state; build one `AccountingCore` per pool.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use ledgerline_core::coa::{CoaError, StepSelection};
use ledgerline_core::idempotency::{
    BeginOutcome, IdempotencyError, IdempotencyPolicy, StoredResponse, fingerprint,
};
use ledgerline_core::ledger::{LedgerError, PostJournalInput, request_hash, resolve_entries};
use ledgerline_core::outbox::{OutboxError, RetryPolicy};
use ledgerline_core::snapshot::SnapshotError;
use ledgerline_core::workflow::{RequestType, WorkflowError};
use ledgerline_shared::{AppConfig, Clock, Holder};

use crate::dispatcher::{OutboxDispatcher, Publisher};
use crate::entities::{coa_accounts, request_coa_accounts, snapshots};
use crate::guard::IdempotencyGuard;
use crate::repositories::{
    AccountRepository, IdempotencyRepository, JournalRepository, JournalWithEntries,
    NewOutboxEvent, OutboxRepository, RuleCatalogRepository, RuleTreeRepository,
    SnapshotRepository,
};

// Success statuses stored by the guarded mutations.
const CREATED: u16 = 201;
const OK: u16 = 200;

/// Entry point wiring the repositories over one pool and clock.
#[derive(Debug, Clone)]
pub struct AccountingCore {
    catalog: RuleCatalogRepository,
    rule_tree: RuleTreeRepository,
    accounts: AccountRepository,
    journals: JournalRepository,
    snapshots: SnapshotRepository,
    outbox: OutboxRepository,
    guard: IdempotencyGuard,
    batch_size: u64,
}

impl AccountingCore {
    /// Creates the core over `db`, reading retry and retention settings from
    /// `config`.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let records = IdempotencyRepository::new(
            db.clone(),
            Arc::clone(&clock),
            IdempotencyPolicy::from_config(&config.idempotency),
        );

        Self {
            catalog: RuleCatalogRepository::new(db.clone(), Arc::clone(&clock)),
            rule_tree: RuleTreeRepository::new(db.clone(), Arc::clone(&clock)),
            accounts: AccountRepository::new(db.clone(), Arc::clone(&clock)),
            journals: JournalRepository::new(db.clone(), Arc::clone(&clock)),
            snapshots: SnapshotRepository::new(db.clone(), Arc::clone(&clock)),
            outbox: OutboxRepository::new(
                db,
                clock,
                RetryPolicy::from_config(&config.outbox),
            ),
            guard: IdempotencyGuard::new(records),
            batch_size: config.outbox.batch_size,
        }
    }

    /// Rule value catalog.
    #[must_use]
    pub const fn catalog(&self) -> &RuleCatalogRepository {
        &self.catalog
    }

    /// Rule types, groups and steps.
    #[must_use]
    pub const fn rule_tree(&self) -> &RuleTreeRepository {
        &self.rule_tree
    }

    /// Accounts and their requests.
    #[must_use]
    pub const fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    /// Journals and entries.
    #[must_use]
    pub const fn journals(&self) -> &JournalRepository {
        &self.journals
    }

    /// Account snapshots.
    #[must_use]
    pub const fn snapshots(&self) -> &SnapshotRepository {
        &self.snapshots
    }

    /// Outbox events.
    #[must_use]
    pub const fn outbox(&self) -> &OutboxRepository {
        &self.outbox
    }

    /// Idempotency guard.
    #[must_use]
    pub const fn guard(&self) -> &IdempotencyGuard {
        &self.guard
    }

    /// Creates a dispatcher delivering this core's outbox through `publisher`.
    #[must_use]
    pub fn dispatcher(&self, publisher: Arc<dyn Publisher>) -> OutboxDispatcher {
        OutboxDispatcher::new(self.outbox.clone(), publisher, self.batch_size)
    }

    /// Builds the account code of a rule selection.
    ///
    /// # Errors
    ///
    /// See [`RuleTreeRepository::build_code`].
    pub async fn build_account_code(
        &self,
        type_code: &str,
        group_code: Option<&str>,
        selections: &[StepSelection],
    ) -> Result<String, CoaError> {
        self.rule_tree
            .build_code(type_code, group_code, selections)
            .await
    }

    /// Submits a CREATE or EDIT account request.
    ///
    /// # Errors
    ///
    /// See [`AccountRepository::submit_request`].
    pub async fn submit_account_request(
        &self,
        request_type: RequestType,
        payload: &serde_json::Value,
        maker_id: Uuid,
        coa_account_id: Option<Uuid>,
    ) -> Result<request_coa_accounts::Model, WorkflowError> {
        self.accounts
            .submit_request(request_type, payload, maker_id, coa_account_id)
            .await
    }

    /// Approves a pending request and applies it.
    ///
    /// # Errors
    ///
    /// See [`AccountRepository::approve_request`].
    pub async fn approve_account_request(
        &self,
        request_id: Uuid,
        checker_id: Uuid,
        comment: Option<String>,
    ) -> Result<coa_accounts::Model, WorkflowError> {
        self.accounts
            .approve_request(request_id, checker_id, comment)
            .await
    }

    /// Rejects a pending request.
    ///
    /// # Errors
    ///
    /// See [`AccountRepository::reject_request`].
    pub async fn reject_account_request(
        &self,
        request_id: Uuid,
        checker_id: Uuid,
        reason: &str,
    ) -> Result<(), WorkflowError> {
        self.accounts
            .reject_request(request_id, checker_id, reason)
            .await
            .map(|_| ())
    }

    /// Posts a balanced journal.
    ///
    /// # Errors
    ///
    /// See [`JournalRepository::post_journal`].
    pub async fn post_journal(
        &self,
        input: &PostJournalInput,
    ) -> Result<JournalWithEntries, LedgerError> {
        self.journals.post_journal(input).await
    }

    /// Reverses a POSTED journal and returns the reversal.
    ///
    /// # Errors
    ///
    /// See [`JournalRepository::reverse_journal`].
    pub async fn reverse_journal(
        &self,
        journal_id: Uuid,
        actor: &Holder,
    ) -> Result<JournalWithEntries, LedgerError> {
        self.journals.reverse_journal(journal_id, actor).await
    }

    /// Computes the DRAFT snapshot of an account.
    ///
    /// # Errors
    ///
    /// See [`SnapshotRepository::compute_snapshot`].
    pub async fn compute_snapshot(
        &self,
        account_id: Uuid,
        as_of_date: NaiveDate,
    ) -> Result<snapshots::Model, SnapshotError> {
        self.snapshots.compute_snapshot(account_id, as_of_date).await
    }

    /// Enqueues an outbox event and returns its row id.
    ///
    /// # Errors
    ///
    /// See [`OutboxRepository::enqueue`].
    pub async fn enqueue_outbox_event(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
        partition_key: &str,
    ) -> Result<Uuid, OutboxError> {
        let event = NewOutboxEvent::new(
            aggregate_type,
            aggregate_id,
            event_type,
            payload,
            partition_key,
        );
        Ok(self.outbox.enqueue(&event).await?.id)
    }

    /// Begins an idempotent operation.
    ///
    /// # Errors
    ///
    /// See [`IdempotencyRepository::begin`].
    pub async fn begin_idempotent(
        &self,
        key: &str,
        request_hash: &str,
    ) -> Result<BeginOutcome, IdempotencyError> {
        self.guard.records().begin(key, request_hash).await
    }

    /// Finishes an idempotent operation.
    ///
    /// # Errors
    ///
    /// See [`IdempotencyRepository::finish`].
    pub async fn finish_idempotent(
        &self,
        key: &str,
        status_code: u16,
        body: &str,
    ) -> Result<(), IdempotencyError> {
        self.guard
            .records()
            .finish(key, status_code, body)
            .await
            .map(|_| ())
    }

    /// Posts a journal under the idempotency guard, keyed by the input's
    /// idempotency key.
    ///
    /// # Errors
    ///
    /// Guard errors only; posting errors are returned as the response.
    pub async fn post_journal_idempotent(
        &self,
        input: &PostJournalInput,
    ) -> Result<StoredResponse, IdempotencyError> {
        let currency = input.currency.trim().to_uppercase();
        let hash = request_hash(
            &currency,
            &input.source,
            &resolve_entries(&currency, &input.entries),
        );

        self.guard
            .execute(&input.idempotency_key, &hash, CREATED, || {
                self.journals.post_journal(input)
            })
            .await
    }

    /// Approves a request under the idempotency guard.
    ///
    /// # Errors
    ///
    /// Guard errors only; workflow errors are returned as the response.
    pub async fn approve_account_request_idempotent(
        &self,
        key: &str,
        request_id: Uuid,
        checker_id: Uuid,
        comment: Option<String>,
    ) -> Result<StoredResponse, IdempotencyError> {
        let hash = fingerprint(
            "approve_account_request",
            &[
                &request_id.to_string(),
                &checker_id.to_string(),
                comment.as_deref().unwrap_or_default(),
            ],
        );

        self.guard
            .execute(key, &hash, OK, || {
                self.accounts
                    .approve_request(request_id, checker_id, comment)
            })
            .await
    }
}
