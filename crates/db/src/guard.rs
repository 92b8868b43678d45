//! Idempotency guard.
//!
//! Wraps a mutation in Begin → handler → Finish so a retried request gets
//! the first attempt's response back instead of running twice.

use std::future::Future;

use serde::Serialize;
use tracing::debug;

use ledgerline_core::idempotency::{BeginOutcome, IdempotencyError, StoredResponse};
use ledgerline_shared::DomainError;

use crate::repositories::idempotency::IdempotencyRepository;

/// Runs handlers at most once per idempotency key.
#[derive(Debug, Clone)]
pub struct IdempotencyGuard {
    records: IdempotencyRepository,
}

impl IdempotencyGuard {
    /// Creates a guard over the given record store.
    #[must_use]
    pub const fn new(records: IdempotencyRepository) -> Self {
        Self { records }
    }

    /// Returns the underlying record store.
    #[must_use]
    pub const fn records(&self) -> &IdempotencyRepository {
        &self.records
    }

    /// Runs `handler` under `key` and returns its response.
    ///
    /// A success is serialized as JSON under `success_status`; a domain error
    /// becomes its error response. Replays return the stored response without
    /// calling `handler`. A 5xx outcome is returned but not stored, so the
    /// request can be retried.
    ///
    /// # Errors
    ///
    /// Errors of `Begin`/`Finish` (`KeyReuseConflict`, `AlreadyInProgress`,
    /// storage failures). Handler errors are part of the response.
    pub async fn execute<T, E, F, Fut>(
        &self,
        key: &str,
        request_hash: &str,
        success_status: u16,
        handler: F,
    ) -> Result<StoredResponse, IdempotencyError>
    where
        T: Serialize,
        E: DomainError,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let BeginOutcome::Replay(response) = self.records.begin(key, request_hash).await? {
            return Ok(response);
        }

        let response = match handler().await {
            Ok(value) => match serde_json::to_string(&value) {
                Ok(body) => StoredResponse::new(success_status, body),
                Err(e) => {
                    let err = IdempotencyError::Integrity(format!("response encoding: {e}"));
                    StoredResponse::from_error(&err)
                }
            },
            Err(e) => {
                debug!(idempotency_key = %key, error_code = e.error_code(), "Guarded handler failed");
                StoredResponse::from_error(&e)
            }
        };

        self.records
            .finish(key, response.status_code, &response.body)
            .await?;
        Ok(response)
    }
}
