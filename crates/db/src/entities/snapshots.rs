//! `SeaORM` Entity for snapshots table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SnapshotStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub as_of_date: Date,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub debit_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub credit_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub movement: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub closing_balance: Decimal,
    pub entry_count: i64,
    pub hash: String,
    pub status: SnapshotStatus,
    pub computed_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::coa_accounts::Entity",
        from = "Column::AccountId",
        to = "super::coa_accounts::Column::Id"
    )]
    CoaAccounts,
}

impl Related<super::coa_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CoaAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
