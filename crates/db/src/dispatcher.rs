//! Outbox dispatcher.
//!
//! Each round claims the due partition heads, hands them to a [`Publisher`]
//! and records the outcome. A publish failure never aborts the round; it is
//! recorded on the event and retried on a later round.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use ledgerline_core::outbox::OutboxError;

use crate::entities::{sea_orm_active_enums::OutboxStatus, transaction_logs};
use crate::repositories::outbox::OutboxRepository;

/// Error returned by a publisher for one event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The downstream system could not be reached.
    #[error("Downstream unavailable: {0}")]
    Unavailable(String),

    /// The downstream system refused the event.
    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Downstream sink for outbox events.
#[async_trait]
pub trait Publisher: Send + Sync + fmt::Debug {
    /// Delivers one event. Delivery must be idempotent on `event_key`, as an
    /// event may be handed out again after a crash.
    async fn publish(&self, event: &transaction_logs::Model) -> Result<(), PublishError>;
}

/// Publisher that writes each event to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, event: &transaction_logs::Model) -> Result<(), PublishError> {
        info!(
            event_key = %event.event_key,
            event_type = %event.event_type,
            partition = %event.partition_key,
            sequence = event.sequence,
            payload = %event.payload,
            "Outbox event"
        );
        Ok(())
    }
}

/// Counts of one dispatcher round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events claimed this round.
    pub claimed: usize,
    /// Events delivered.
    pub published: usize,
    /// Events that failed and were rescheduled.
    pub failed: usize,
    /// Events that failed for the last time.
    pub dead: usize,
}

/// Delivers due outbox events through a publisher.
#[derive(Debug, Clone)]
pub struct OutboxDispatcher {
    outbox: OutboxRepository,
    publisher: Arc<dyn Publisher>,
    batch_size: u64,
}

impl OutboxDispatcher {
    /// Creates a dispatcher claiming up to `batch_size` events per round.
    #[must_use]
    pub fn new(outbox: OutboxRepository, publisher: Arc<dyn Publisher>, batch_size: u64) -> Self {
        Self {
            outbox,
            publisher,
            batch_size: batch_size.max(1),
        }
    }

    /// Runs one delivery round.
    ///
    /// # Errors
    ///
    /// Returns an error if claiming or recording an outcome fails in the
    /// database. Publisher failures are recorded, not returned.
    pub async fn run_once(&self) -> Result<DispatchReport, OutboxError> {
        let due = self.outbox.claim_due(self.batch_size).await?;
        let mut report = DispatchReport {
            claimed: due.len(),
            ..DispatchReport::default()
        };

        for event in due {
            match self.publisher.publish(&event).await {
                Ok(()) => {
                    self.outbox.mark_published(event.id).await?;
                    report.published += 1;
                }
                Err(e) => {
                    let row = self.outbox.mark_failed(event.id, &e.to_string()).await?;
                    if row.status == OutboxStatus::Dead {
                        report.dead += 1;
                    } else {
                        report.failed += 1;
                    }
                }
            }
        }

        if report.claimed > 0 {
            debug!(
                claimed = report.claimed,
                published = report.published,
                failed = report.failed,
                dead = report.dead,
                "Dispatcher round finished"
            );
        }
        if report.dead > 0 {
            warn!(dead = report.dead, "Outbox events dead-lettered this round");
        }
        Ok(report)
    }
}
