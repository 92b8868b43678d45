//! `SeaORM` Entity for rule_steps table.
//!
//! A step belongs to a type, and to one of its groups when the type has a
//! group dimension. SELECT steps reference a category; TEXT steps carry an
//! optional label.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StepKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rule_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub type_id: Uuid,
    pub group_id: Option<Uuid>,
    pub step_order: i32,
    pub kind: StepKind,
    pub category_id: Option<Uuid>,
    pub label: Option<String>,
    pub required: bool,
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
    #[sea_orm(
        belongs_to = "super::rule_groups::Entity",
        from = "Column::GroupId",
        to = "super::rule_groups::Column::Id"
    )]
    RuleGroups,
    #[sea_orm(
        belongs_to = "super::rule_categories::Entity",
        from = "Column::CategoryId",
        to = "super::rule_categories::Column::Id"
    )]
    RuleCategories,
}

impl Related<super::rule_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleTypes.def()
    }
}

impl Related<super::rule_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleGroups.def()
    }
}

impl Related<super::rule_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
