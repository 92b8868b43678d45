//! Core accounting logic for Ledgerline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `coa` - Rule tree and account code builder
//! - `workflow` - Maker-checker workflow for account requests
//! - `ledger` - Double-entry journal validation and reversal
//! - `snapshot` - Dated balance rollups
//! - `outbox` - Delivery status and retry policy for outbox events
//! - `idempotency` - Idempotency record state machine

pub mod coa;
pub mod error;
pub mod idempotency;
pub mod ledger;
pub mod outbox;
pub mod snapshot;
pub mod workflow;

pub use error::FromStorage;
