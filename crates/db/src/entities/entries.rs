//! `SeaORM` Entity for entries table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::Dc;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub journal_id: Uuid,
    pub line_no: i32,
    pub account_id: Uuid,
    pub dc: Dc,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub memo: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journals::Entity",
        from = "Column::JournalId",
        to = "super::journals::Column::Id"
    )]
    Journals,
    #[sea_orm(
        belongs_to = "super::coa_accounts::Entity",
        from = "Column::AccountId",
        to = "super::coa_accounts::Column::Id"
    )]
    CoaAccounts,
}

impl Related<super::journals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journals.def()
    }
}

impl Related<super::coa_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CoaAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
