//! Idempotency record state machine.
//!
//! A key moves from no-record to IN_PROGRESS on first sighting and ends in
//! COMPLETED or FAILED with the response stored for replay. Server-side
//! failures release the key instead, so a retry can re-attempt.

pub mod decision;
pub mod error;
pub mod fingerprint;
pub mod types;

#[cfg(test)]
mod decision_props;

pub use decision::{BeginDecision, IdempotencyPolicy};
pub use error::IdempotencyError;
pub use fingerprint::fingerprint;
pub use types::{BeginOutcome, FinishOutcome, IdempotencyStatus, RecordView, StoredResponse};
