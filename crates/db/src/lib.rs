//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - The outbox dispatcher and the idempotency guard
//! - [`AccountingCore`], the boundary of the accounting core

pub mod dispatcher;
pub mod entities;
mod error;
pub mod facade;
pub mod guard;
pub mod migration;
pub mod repositories;

pub use dispatcher::{DispatchReport, LogPublisher, OutboxDispatcher, PublishError, Publisher};
pub use facade::AccountingCore;
pub use guard::IdempotencyGuard;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use ledgerline_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized by the database configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
