//! `SeaORM` Entity for rule_groups table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rule_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub type_id: Uuid,
    pub code: String,
    pub name: String,
    pub separator: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rule_types::Entity",
        from = "Column::TypeId",
        to = "super::rule_types::Column::Id"
    )]
    RuleTypes,
}

impl Related<super::rule_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
