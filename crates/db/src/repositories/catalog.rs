//! Rule catalog repository.
//!
//! Categories and their values feed the SELECT steps of the rule tree.
//! Values are soft-deleted and never removed, so codes built earlier remain
//! explainable.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use ledgerline_core::coa::CoaError;
use ledgerline_shared::Clock;

use crate::entities::{rule_categories, rule_values};
use crate::error::{db_err, is_unique_violation};

/// Repository for rule categories and values.
#[derive(Debug, Clone)]
pub struct RuleCatalogRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl RuleCatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// - `BlankField` if the code or name is blank
    /// - `DuplicateCategory` if the code is taken
    pub async fn create_category(
        &self,
        code: &str,
        name: &str,
    ) -> Result<rule_categories::Model, CoaError> {
        let code = non_blank(code, "code")?;
        let name = non_blank(name, "name")?;

        if self.find_category(code).await?.is_some() {
            return Err(CoaError::DuplicateCategory(code.to_string()));
        }

        let now = self.clock.now();
        let category = rule_categories::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let category = category.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                CoaError::DuplicateCategory(code.to_string())
            } else {
                db_err(e)
            }
        })?;

        info!(category = %category.code, "Rule category created");
        Ok(category)
    }

    /// Finds a category by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_category(
        &self,
        code: &str,
    ) -> Result<Option<rule_categories::Model>, CoaError> {
        rule_categories::Entity::find()
            .filter(rule_categories::Column::Code.eq(code.trim()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Adds a value to a category.
    ///
    /// # Errors
    ///
    /// - `UnknownCategory` if the category does not exist
    /// - `DuplicateValue` if the value exists in the category, even soft-deleted
    pub async fn add_value(
        &self,
        category_code: &str,
        value: &str,
        name: &str,
        sort_order: i32,
    ) -> Result<rule_values::Model, CoaError> {
        let category = self.category(category_code).await?;
        let value = non_blank(value, "value")?;
        let name = non_blank(name, "name")?;

        let duplicate = || CoaError::DuplicateValue {
            category: category.code.clone(),
            value: value.to_string(),
        };

        if self.find_value(category.id, value).await?.is_some() {
            return Err(duplicate());
        }

        let now = self.clock.now();
        let row = rule_values::ActiveModel {
            id: Set(Uuid::now_v7()),
            category_id: Set(category.id),
            value: Set(value.to_string()),
            name: Set(name.to_string()),
            sort_order: Set(sort_order),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let row = row.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                duplicate()
            } else {
                db_err(e)
            }
        })?;

        info!(category = %category.code, value = %row.value, "Rule value added");
        Ok(row)
    }

    /// Renames a value. Soft-deleted values can be renamed too.
    ///
    /// # Errors
    ///
    /// `UnknownCategory` / `UnknownValue` if either does not exist.
    pub async fn rename_value(
        &self,
        category_code: &str,
        value: &str,
        name: &str,
    ) -> Result<rule_values::Model, CoaError> {
        let name = non_blank(name, "name")?;
        let row = self.existing_value(category_code, value).await?;

        let mut active: rule_values::ActiveModel = row.into();
        active.name = Set(name.to_string());
        active.updated_at = Set(self.clock.now());

        active.update(&self.db).await.map_err(db_err)
    }

    /// Soft-deletes a value. Deleting an already deleted value is a no-op.
    ///
    /// # Errors
    ///
    /// `UnknownCategory` / `UnknownValue` if either does not exist.
    pub async fn soft_delete_value(
        &self,
        category_code: &str,
        value: &str,
    ) -> Result<rule_values::Model, CoaError> {
        let row = self.existing_value(category_code, value).await?;
        if row.deleted_at.is_some() {
            return Ok(row);
        }

        let now = self.clock.now();
        let mut active: rule_values::ActiveModel = row.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);

        let row = active.update(&self.db).await.map_err(db_err)?;
        info!(category = %category_code, value = %row.value, "Rule value deleted");
        Ok(row)
    }

    /// Lists the values of a category ordered by `sort_order`, then value.
    ///
    /// # Errors
    ///
    /// `UnknownCategory` if the category does not exist.
    pub async fn list_values(
        &self,
        category_code: &str,
        include_deleted: bool,
    ) -> Result<Vec<rule_values::Model>, CoaError> {
        let category = self.category(category_code).await?;

        let mut query =
            rule_values::Entity::find().filter(rule_values::Column::CategoryId.eq(category.id));
        if !include_deleted {
            query = query.filter(rule_values::Column::DeletedAt.is_null());
        }

        query
            .order_by_asc(rule_values::Column::SortOrder)
            .order_by_asc(rule_values::Column::Value)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn category(&self, code: &str) -> Result<rule_categories::Model, CoaError> {
        self.find_category(code)
            .await?
            .ok_or_else(|| CoaError::UnknownCategory(code.trim().to_string()))
    }

    async fn find_value(
        &self,
        category_id: Uuid,
        value: &str,
    ) -> Result<Option<rule_values::Model>, CoaError> {
        rule_values::Entity::find()
            .filter(rule_values::Column::CategoryId.eq(category_id))
            .filter(rule_values::Column::Value.eq(value))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    async fn existing_value(
        &self,
        category_code: &str,
        value: &str,
    ) -> Result<rule_values::Model, CoaError> {
        let category = self.category(category_code).await?;
        let value = value.trim();

        self.find_value(category.id, value)
            .await?
            .ok_or_else(|| CoaError::UnknownValue {
                category: category.code,
                value: value.to_string(),
            })
    }
}

/// Trims `text`, rejecting blank input.
pub(crate) fn non_blank<'a>(text: &'a str, field: &'static str) -> Result<&'a str, CoaError> {
    let text = text.trim();
    if text.is_empty() {
        Err(CoaError::BlankField(field))
    } else {
        Ok(text)
    }
}
