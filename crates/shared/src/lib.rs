//! Shared types, errors, and configuration for Ledgerline.
//!
//! This crate provides common building blocks used across all other crates:
//! - Application-wide error type and error classification
//! - Configuration management
//! - The injectable clock
//! - Caller identity (`Holder`)

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{AppError, AppResult, DomainError, ErrorClass};
pub use types::Holder;
