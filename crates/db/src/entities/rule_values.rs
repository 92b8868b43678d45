//! `SeaORM` Entity for rule_values table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rule_values")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub value: String,
    pub name: String,
    pub sort_order: i32,
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rule_categories::Entity",
        from = "Column::CategoryId",
        to = "super::rule_categories::Column::Id"
    )]
    RuleCategories,
}

impl Related<super::rule_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
