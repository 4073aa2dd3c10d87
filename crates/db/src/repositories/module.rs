//! Module repository for database operations.
//!
//! A module groups permissions; its code is the prefix of every permission
//! code it owns.

use std::sync::Arc;

use bastion_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{modules, permissions};
use crate::error::db_error;

/// Error types for module operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// Module not found.
    #[error("Module not found: {0}")]
    NotFound(Uuid),

    /// Module code already exists.
    #[error("Module code '{0}' already exists")]
    DuplicateCode(String),

    /// Module still owns permissions.
    #[error("Module '{code}' still has {count} permission(s)")]
    HasPermissions {
        /// Module code.
        code: String,
        /// Number of permissions referencing the module.
        count: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ModuleError> for AppError {
    fn from(err: ModuleError) -> Self {
        match err {
            ModuleError::NotFound(_) => Self::NotFound(err.to_string()),
            ModuleError::DuplicateCode(_) | ModuleError::HasPermissions { .. } => {
                Self::Conflict(err.to_string())
            }
            ModuleError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a module.
#[derive(Debug, Clone)]
pub struct CreateModuleInput {
    /// Module code (snake_case, unique).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Sort order for display.
    pub sort_order: i32,
    /// Whether the module is active.
    pub is_active: bool,
}

/// Input for updating a module. The code is immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateModuleInput {
    /// Display name.
    pub name: Option<String>,
    /// Description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// Sort order.
    pub sort_order: Option<i32>,
    /// Whether the module is active.
    pub is_active: Option<bool>,
}

/// Filter options for listing modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleFilter {
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Module repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ModuleRepository {
    db: Arc<DatabaseConnection>,
}

impl ModuleRepository {
    /// Creates a new module repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists modules ordered by sort order, then code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: ModuleFilter) -> Result<Vec<modules::Model>, DbErr> {
        let mut query = modules::Entity::find();
        if let Some(is_active) = filter.is_active {
            query = query.filter(modules::Column::IsActive.eq(is_active));
        }

        query
            .order_by_asc(modules::Column::SortOrder)
            .order_by_asc(modules::Column::Code)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a module by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<modules::Model>, DbErr> {
        modules::Entity::find()
            .filter(modules::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
    }

    /// Gets a module by ID.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::NotFound` if the module does not exist.
    pub async fn get(&self, id: Uuid) -> Result<modules::Model, ModuleError> {
        modules::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(ModuleError::NotFound(id))
    }

    /// Creates a module.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::DuplicateCode` if the code is taken.
    pub async fn create(&self, input: CreateModuleInput) -> Result<modules::Model, ModuleError> {
        if self.find_by_code(&input.code).await?.is_some() {
            return Err(ModuleError::DuplicateCode(input.code));
        }

        let now = chrono::Utc::now().into();
        let module = modules::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(input.code),
            name: Set(input.name),
            description: Set(input.description),
            sort_order: Set(input.sort_order),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(module.insert(self.db.as_ref()).await?)
    }

    /// Updates a module.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::NotFound` if the module does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateModuleInput,
    ) -> Result<modules::Model, ModuleError> {
        let existing = self.get(id).await?;

        let mut module: modules::ActiveModel = existing.into();
        if let Some(name) = input.name {
            module.name = Set(name);
        }
        if let Some(description) = input.description {
            module.description = Set(description);
        }
        if let Some(sort_order) = input.sort_order {
            module.sort_order = Set(sort_order);
        }
        if let Some(is_active) = input.is_active {
            module.is_active = Set(is_active);
        }
        module.updated_at = Set(chrono::Utc::now().into());

        Ok(module.update(self.db.as_ref()).await?)
    }

    /// Deletes a module that no longer owns permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The module does not exist
    /// - Permissions still reference the module
    pub async fn delete(&self, id: Uuid) -> Result<(), ModuleError> {
        let module = self.get(id).await?;

        let count = permissions::Entity::find()
            .filter(permissions::Column::ModuleId.eq(id))
            .count(self.db.as_ref())
            .await?;
        if count > 0 {
            return Err(ModuleError::HasPermissions {
                code: module.code,
                count,
            });
        }

        modules::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::count_row;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn module(code: &str) -> modules::Model {
        let now = chrono::Utc::now().into();
        modules::Model {
            id: Uuid::new_v4(),
            code: code.into(),
            name: code.into(),
            description: None,
            sort_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_module() {
        let created = module("users");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<modules::Model>::new()])
            .append_query_results([vec![created.clone()]])
            .into_connection();
        let repo = ModuleRepository::new(db);

        let result = repo
            .create(CreateModuleInput {
                code: "users".into(),
                name: "users".into(),
                description: None,
                sort_order: 0,
                is_active: true,
            })
            .await
            .unwrap();

        assert_eq!(result.code, "users");
    }

    #[tokio::test]
    async fn test_delete_refuses_module_with_permissions() {
        let existing = module("users");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([[count_row(4)]])
            .into_connection();
        let repo = ModuleRepository::new(db);

        let err = repo.delete(existing.id).await.unwrap_err();
        assert!(matches!(
            err,
            ModuleError::HasPermissions { ref code, count: 4 } if code == "users"
        ));
        assert_eq!(AppError::from(err).status_code(), 409);
    }

    #[tokio::test]
    async fn test_update_clears_description() {
        let mut existing = module("users");
        existing.description = Some("old".into());
        let mut updated = existing.clone();
        updated.description = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![updated]])
            .into_connection();
        let repo = ModuleRepository::new(db);

        let result = repo
            .update(
                existing.id,
                UpdateModuleInput {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(result.description.is_none());
    }
}
