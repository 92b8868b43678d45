//! Storage error mapping.

use ledgerline_core::FromStorage;
use sea_orm::{DbErr, SqlErr};

/// Wraps a `DbErr` into the `Database` variant of a domain error.
///
/// Used as `.map_err(db_err)?` on every query.
pub(crate) fn db_err<E: FromStorage>(err: DbErr) -> E {
    E::from_storage(err.to_string())
}

/// Returns true if `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
