//! Transactional outbox.
//!
//! Events are written in the same transaction as the change that caused
//! them and delivered later by a dispatcher. This module holds the delivery
//! state machine and the retry schedule.

pub mod error;
pub mod retry;
pub mod types;

#[cfg(test)]
mod retry_props;

pub use error::OutboxError;
pub use retry::{RetryDecision, RetryPolicy};
pub use types::{OutboxStatus, event_key};
