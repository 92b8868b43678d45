//! `SeaORM` Entity for journals table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::JournalStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub request_hash: String,
    pub status: JournalStatus,
    pub currency: String,
    pub source: String,
    pub ts: DateTimeUtc,
    pub posted_at: Option<DateTimeUtc>,
    pub posted_by: Option<String>,
    pub reversal_of_id: Option<Uuid>,
    pub lock_version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReversalOfId",
        to = "Column::Id"
    )]
    ReversalOf,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
