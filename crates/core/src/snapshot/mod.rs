//! Dated balance snapshots.
//!
//! A snapshot rolls the booked entries of one account up to a date:
//! `opening_balance + movement == closing_balance`, with the opening taken
//! from the previous snapshot. A content hash makes recomputation verifiable.

pub mod compute;
pub mod error;

#[cfg(test)]
mod compute_props;

pub use compute::{
    PriorCoverage, SnapshotCalculator, SnapshotFigures, SnapshotStatus, SnapshotVerification,
    SnapshotWindow,
};
pub use error::SnapshotError;
