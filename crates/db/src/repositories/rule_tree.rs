//! Rule tree repository.
//!
//! Loads `(type, group?)` trees into the core [`RuleTree`] value and runs the
//! code builder over them. Step lists are replaced atomically.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use ledgerline_core::coa::{
    CoaError, CodeBuilder, RuleTree, Segment, StepDefinition, StepKind, StepSelection, TreeKey,
    TreeStep, validate_step_definitions,
};
use ledgerline_shared::Clock;

use crate::entities::{
    rule_categories, rule_groups, rule_steps, rule_types, rule_values,
    sea_orm_active_enums::StepKind as DbStepKind,
};
use crate::error::{db_err, is_unique_violation};
use crate::repositories::catalog::non_blank;

/// Repository for rule types, groups and steps.
#[derive(Debug, Clone)]
pub struct RuleTreeRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl RuleTreeRepository {
    /// Creates a new rule tree repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Creates a rule type.
    ///
    /// # Errors
    ///
    /// - `BlankField` if the code, name or separator is blank
    /// - `DuplicateNode` if the code is taken
    pub async fn create_type(
        &self,
        code: &str,
        name: &str,
        separator: &str,
        has_group: bool,
    ) -> Result<rule_types::Model, CoaError> {
        let code = non_blank(code, "code")?;
        let name = non_blank(name, "name")?;
        if separator.is_empty() {
            return Err(CoaError::BlankField("separator"));
        }

        if find_type(&self.db, code).await?.is_some() {
            return Err(CoaError::DuplicateNode(code.to_string()));
        }

        let row = rule_types::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            separator: Set(separator.to_string()),
            has_group: Set(has_group),
            created_at: Set(self.clock.now()),
        };

        let row = row.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                CoaError::DuplicateNode(code.to_string())
            } else {
                db_err(e)
            }
        })?;

        info!(type_code = %row.code, has_group, "Rule type created");
        Ok(row)
    }

    /// Creates a group under a type with a group dimension.
    ///
    /// # Errors
    ///
    /// - `UnknownType` if the type does not exist
    /// - `UnexpectedGroup` if the type has no group dimension
    /// - `DuplicateNode` if the group code is taken within the type
    pub async fn create_group(
        &self,
        type_code: &str,
        code: &str,
        name: &str,
        separator: &str,
    ) -> Result<rule_groups::Model, CoaError> {
        let rule_type = require_type(&self.db, type_code).await?;
        let code = non_blank(code, "code")?;
        let name = non_blank(name, "name")?;
        if separator.is_empty() {
            return Err(CoaError::BlankField("separator"));
        }

        if !rule_type.has_group {
            return Err(CoaError::UnexpectedGroup {
                type_code: rule_type.code,
                group_code: code.to_string(),
            });
        }

        let node = TreeKey {
            type_code: rule_type.code.clone(),
            group_code: Some(code.to_string()),
        };

        if find_group(&self.db, rule_type.id, code).await?.is_some() {
            return Err(CoaError::DuplicateNode(node.to_string()));
        }

        let row = rule_groups::ActiveModel {
            id: Set(Uuid::now_v7()),
            type_id: Set(rule_type.id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            separator: Set(separator.to_string()),
            created_at: Set(self.clock.now()),
        };

        let row = row.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                CoaError::DuplicateNode(node.to_string())
            } else {
                db_err(e)
            }
        })?;

        info!(node = %node, "Rule group created");
        Ok(row)
    }

    /// Replaces the step list of `(type, group?)`.
    ///
    /// Delete and insert run in one transaction under a lock on the type row;
    /// readers see either the old list or the new one.
    ///
    /// # Errors
    ///
    /// - `UnknownType` / `GroupRequired` / `UnexpectedGroup` / `UnknownGroup`
    /// - `DuplicateStepOrder` if two steps share an order
    /// - `UnknownCategory` if a SELECT step names a missing category
    pub async fn replace_steps(
        &self,
        type_code: &str,
        group_code: Option<&str>,
        steps: &[StepDefinition],
    ) -> Result<RuleTree, CoaError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let (rule_type, group) = resolve_node(&txn, type_code, group_code).await?;

        // Concurrent replacements of any tree under this type queue here.
        rule_types::Entity::find_by_id(rule_type.id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoaError::UnknownType(rule_type.code.clone()))?;

        let categories: HashMap<String, Uuid> = rule_categories::Entity::find()
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.code, c.id))
            .collect();
        let known: HashSet<String> = categories.keys().cloned().collect();

        validate_step_definitions(steps, &known)?;

        let mut delete = rule_steps::Entity::delete_many()
            .filter(rule_steps::Column::TypeId.eq(rule_type.id));
        delete = match &group {
            Some(group) => delete.filter(rule_steps::Column::GroupId.eq(group.id)),
            None => delete.filter(rule_steps::Column::GroupId.is_null()),
        };
        let removed = delete.exec(&txn).await.map_err(db_err)?.rows_affected;

        let now = self.clock.now();
        for step in steps {
            let (kind, category_id, label, required) = match &step.kind {
                StepKind::Select { category } => {
                    (DbStepKind::Select, categories.get(category).copied(), None, true)
                }
                StepKind::Text { label, required } => {
                    (DbStepKind::Text, None, label.clone(), *required)
                }
            };

            let row = rule_steps::ActiveModel {
                id: Set(Uuid::now_v7()),
                type_id: Set(rule_type.id),
                group_id: Set(group.as_ref().map(|g| g.id)),
                step_order: Set(step.step_order),
                kind: Set(kind),
                category_id: Set(category_id),
                label: Set(label),
                required: Set(required),
                separator: Set(step.separator.clone()),
                created_at: Set(now),
            };
            row.insert(&txn).await.map_err(db_err)?;
        }

        let tree = load_tree(&txn, type_code, group_code).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            node = %tree.root,
            removed,
            inserted = steps.len(),
            "Rule steps replaced"
        );
        Ok(tree)
    }

    /// Loads the tree of `(type, group?)` with the active values of every
    /// SELECT step.
    ///
    /// # Errors
    ///
    /// `UnknownType` / `GroupRequired` / `UnexpectedGroup` / `UnknownGroup`.
    pub async fn load_tree(
        &self,
        type_code: &str,
        group_code: Option<&str>,
    ) -> Result<RuleTree, CoaError> {
        load_tree(&self.db, type_code, group_code).await
    }

    /// Builds the account code for the given selections.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::load_tree`] or [`CodeBuilder::build`].
    pub async fn build_code(
        &self,
        type_code: &str,
        group_code: Option<&str>,
        selections: &[StepSelection],
    ) -> Result<String, CoaError> {
        let tree = self.load_tree(type_code, group_code).await?;
        let code = CodeBuilder::build(&tree, selections)?;

        debug!(node = %tree.root, code = %code, "Account code built");
        Ok(code)
    }
}

async fn find_type<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<rule_types::Model>, CoaError> {
    rule_types::Entity::find()
        .filter(rule_types::Column::Code.eq(code))
        .one(conn)
        .await
        .map_err(db_err)
}

async fn require_type<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<rule_types::Model, CoaError> {
    let code = code.trim();
    find_type(conn, code)
        .await?
        .ok_or_else(|| CoaError::UnknownType(code.to_string()))
}

async fn find_group<C: ConnectionTrait>(
    conn: &C,
    type_id: Uuid,
    code: &str,
) -> Result<Option<rule_groups::Model>, CoaError> {
    rule_groups::Entity::find()
        .filter(rule_groups::Column::TypeId.eq(type_id))
        .filter(rule_groups::Column::Code.eq(code))
        .one(conn)
        .await
        .map_err(db_err)
}

/// Resolves the type row and, when the type has a group dimension, the
/// group row.
async fn resolve_node<C: ConnectionTrait>(
    conn: &C,
    type_code: &str,
    group_code: Option<&str>,
) -> Result<(rule_types::Model, Option<rule_groups::Model>), CoaError> {
    let rule_type = require_type(conn, type_code).await?;
    let key = TreeKey::resolve(&rule_type.code, rule_type.has_group, group_code)?;

    let group = match key.group_code {
        Some(code) => Some(find_group(conn, rule_type.id, &code).await?.ok_or_else(|| {
            CoaError::UnknownGroup {
                type_code: rule_type.code.clone(),
                group_code: code.clone(),
            }
        })?),
        None => None,
    };

    Ok((rule_type, group))
}

pub(crate) async fn load_tree<C: ConnectionTrait>(
    conn: &C,
    type_code: &str,
    group_code: Option<&str>,
) -> Result<RuleTree, CoaError> {
    let (rule_type, group) = resolve_node(conn, type_code, group_code).await?;

    let mut query =
        rule_steps::Entity::find().filter(rule_steps::Column::TypeId.eq(rule_type.id));
    query = match &group {
        Some(group) => query.filter(rule_steps::Column::GroupId.eq(group.id)),
        None => query.filter(rule_steps::Column::GroupId.is_null()),
    };
    let rows = query
        .order_by_asc(rule_steps::Column::StepOrder)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut steps = Vec::with_capacity(rows.len());
    for row in rows {
        steps.push(tree_step(conn, row).await?);
    }

    let mut segments = vec![Segment {
        code: rule_type.code.clone(),
        separator: rule_type.separator.clone(),
    }];
    if let Some(group) = &group {
        segments.push(Segment {
            code: group.code.clone(),
            separator: group.separator.clone(),
        });
    }

    let root = TreeKey {
        type_code: rule_type.code,
        group_code: group.map(|g| g.code),
    };

    Ok(RuleTree::new(root, segments, steps))
}

async fn tree_step<C: ConnectionTrait>(
    conn: &C,
    row: rule_steps::Model,
) -> Result<TreeStep, CoaError> {
    let (kind, values) = match row.kind {
        DbStepKind::Text => (
            StepKind::Text {
                label: row.label,
                required: row.required,
            },
            Vec::new(),
        ),
        DbStepKind::Select => {
            let category_id = row.category_id.ok_or_else(|| {
                CoaError::Database(format!("SELECT step {} has no category", row.id))
            })?;
            let category = rule_categories::Entity::find_by_id(category_id)
                .one(conn)
                .await
                .map_err(db_err)?
                .ok_or_else(|| CoaError::UnknownCategory(category_id.to_string()))?;

            let values = rule_values::Entity::find()
                .filter(rule_values::Column::CategoryId.eq(category_id))
                .filter(rule_values::Column::DeletedAt.is_null())
                .order_by_asc(rule_values::Column::SortOrder)
                .order_by_asc(rule_values::Column::Value)
                .all(conn)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|v| v.value)
                .collect();

            (
                StepKind::Select {
                    category: category.code,
                },
                values,
            )
        }
    };

    Ok(TreeStep {
        definition: StepDefinition {
            step_order: row.step_order,
            kind,
            separator: row.separator,
        },
        values,
    })
}
