//! Enum columns.
//!
//! Every enum is stored as a short string so the schema stays portable
//! between PostgreSQL and SQLite. Each one converts to and from its
//! counterpart in `ledgerline-core`.

use ledgerline_core::idempotency::IdempotencyStatus as CoreIdempotencyStatus;
use ledgerline_core::ledger::{AccountType as CoreAccountType, Dc as CoreDc};
use ledgerline_core::ledger::JournalStatus as CoreJournalStatus;
use ledgerline_core::outbox::OutboxStatus as CoreOutboxStatus;
use ledgerline_core::snapshot::SnapshotStatus as CoreSnapshotStatus;
use ledgerline_core::workflow::{
    AccountStatus as CoreAccountStatus, RequestStatus as CoreRequestStatus,
    RequestType as CoreRequestType,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mirrors a storage enum onto its core enum, variant by variant.
macro_rules! mirror_enum {
    ($db:ident <=> $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum StepKind {
    #[sea_orm(string_value = "SELECT")]
    Select,
    #[sea_orm(string_value = "TEXT")]
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum AccountType {
    #[sea_orm(string_value = "ASSET")]
    Asset,
    #[sea_orm(string_value = "LIAB")]
    Liability,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "REV")]
    Revenue,
    #[sea_orm(string_value = "EXP")]
    Expense,
}

mirror_enum!(AccountType <=> CoreAccountType { Asset, Liability, Equity, Revenue, Expense });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
}

mirror_enum!(AccountStatus <=> CoreAccountStatus { Active, Inactive });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum RequestType {
    #[sea_orm(string_value = "CREATE")]
    Create,
    #[sea_orm(string_value = "EDIT")]
    Edit,
}

mirror_enum!(RequestType <=> CoreRequestType { Create, Edit });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

mirror_enum!(RequestStatus <=> CoreRequestStatus { Pending, Approved, Rejected });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum JournalStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

mirror_enum!(JournalStatus <=> CoreJournalStatus { Draft, Posted, Reversed });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum Dc {
    #[sea_orm(string_value = "D")]
    D,
    #[sea_orm(string_value = "C")]
    C,
}

mirror_enum!(Dc <=> CoreDc { D, C });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum SnapshotStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "LOCKED")]
    Locked,
}

mirror_enum!(SnapshotStatus <=> CoreSnapshotStatus { Draft, Locked });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OutboxStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PUBLISHED")]
    Published,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "DEAD")]
    Dead,
}

mirror_enum!(OutboxStatus <=> CoreOutboxStatus { Pending, Published, Failed, Dead });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum IdempotencyStatus {
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

mirror_enum!(IdempotencyStatus <=> CoreIdempotencyStatus { InProgress, Completed, Failed });
