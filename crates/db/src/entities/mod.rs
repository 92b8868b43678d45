//! `SeaORM` entities.

pub mod coa_accounts;
pub mod entries;
pub mod idempotency_records;
pub mod journals;
pub mod request_coa_accounts;
pub mod rule_categories;
pub mod rule_groups;
pub mod rule_steps;
pub mod rule_types;
pub mod rule_values;
pub mod sea_orm_active_enums;
pub mod snapshots;
pub mod transaction_logs;
