//! `SeaORM` Entity for rule_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rule_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub separator: String,
    pub has_group: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rule_groups::Entity")]
    RuleGroups,
    #[sea_orm(has_many = "super::rule_steps::Entity")]
    RuleSteps,
}

impl Related<super::rule_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleGroups.def()
    }
}

impl Related<super::rule_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RuleSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
