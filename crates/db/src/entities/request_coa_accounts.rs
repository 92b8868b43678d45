//! `SeaORM` Entity for request_coa_accounts table.
//!
//! The proposed change is kept as opaque JSON text in `payload`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{RequestStatus, RequestType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "request_coa_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_type: RequestType,
    pub request_status: RequestStatus,
    pub coa_account_id: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    pub maker_id: Uuid,
    pub checker_id: Option<Uuid>,
    pub checker_comment: Option<String>,
    pub reject_reason: Option<String>,
    pub checked_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::coa_accounts::Entity",
        from = "Column::CoaAccountId",
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
