//! Permission repository for database operations.

use std::sync::Arc;

use bastion_core::permission::{PermissionCode, PermissionError};
use bastion_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{modules, permissions};
use crate::error::db_error;

/// Error types for permission definition operations.
#[derive(Debug, thiserror::Error)]
pub enum PermissionRepoError {
    /// Permission not found.
    #[error("Permission not found: {0}")]
    NotFound(Uuid),

    /// Owning module not found.
    #[error("Module not found: {0}")]
    ModuleNotFound(Uuid),

    /// Permission code already exists.
    #[error("Permission code '{0}' already exists")]
    DuplicateCode(String),

    /// Code does not follow the `<module>.<action>` grammar.
    #[error(transparent)]
    InvalidCode(#[from] PermissionError),

    /// Module segment of the code differs from the owning module.
    #[error("Permission code '{code}' must start with '{module}.'")]
    ModuleMismatch {
        /// Offending code.
        code: String,
        /// Code of the owning module.
        module: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PermissionRepoError> for AppError {
    fn from(err: PermissionRepoError) -> Self {
        match err {
            PermissionRepoError::NotFound(_) => Self::NotFound(err.to_string()),
            PermissionRepoError::ModuleNotFound(_)
            | PermissionRepoError::InvalidCode(_)
            | PermissionRepoError::ModuleMismatch { .. } => Self::Validation(err.to_string()),
            PermissionRepoError::DuplicateCode(_) => Self::Conflict(err.to_string()),
            PermissionRepoError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a permission.
#[derive(Debug, Clone)]
pub struct CreatePermissionInput {
    /// Owning module.
    pub module_id: Uuid,
    /// `<module>.<action>` code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// Input for updating a permission. Code and module are immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdatePermissionInput {
    /// Display name.
    pub name: Option<String>,
    /// Description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
}

/// Permission repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    db: Arc<DatabaseConnection>,
}

impl PermissionRepository {
    /// Creates a new permission repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists permissions ordered by code, optionally for one module.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, module_id: Option<Uuid>) -> Result<Vec<permissions::Model>, DbErr> {
        let mut query = permissions::Entity::find();
        if let Some(module_id) = module_id {
            query = query.filter(permissions::Column::ModuleId.eq(module_id));
        }

        query
            .order_by_asc(permissions::Column::Code)
            .all(self.db.as_ref())
            .await
    }

    /// Gets a permission by ID.
    ///
    /// # Errors
    ///
    /// Returns `PermissionRepoError::NotFound` if the permission does not exist.
    pub async fn get(&self, id: Uuid) -> Result<permissions::Model, PermissionRepoError> {
        permissions::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(PermissionRepoError::NotFound(id))
    }

    /// Finds a permission by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<permissions::Model>, DbErr> {
        permissions::Entity::find()
            .filter(permissions::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
    }

    /// Creates a permission under a module.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The code is malformed or does not start with the module's code
    /// - The module does not exist
    /// - The code is taken
    pub async fn create(
        &self,
        input: CreatePermissionInput,
    ) -> Result<permissions::Model, PermissionRepoError> {
        let code = PermissionCode::parse(&input.code)?;

        let module = modules::Entity::find_by_id(input.module_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(PermissionRepoError::ModuleNotFound(input.module_id))?;
        if code.module() != module.code {
            return Err(PermissionRepoError::ModuleMismatch {
                code: input.code,
                module: module.code,
            });
        }

        if self.find_by_code(code.as_str()).await?.is_some() {
            return Err(PermissionRepoError::DuplicateCode(input.code));
        }

        let now = chrono::Utc::now().into();
        let permission = permissions::ActiveModel {
            id: Set(Uuid::new_v4()),
            module_id: Set(module.id),
            code: Set(input.code),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(permission.insert(self.db.as_ref()).await?)
    }

    /// Updates a permission's name or description.
    ///
    /// # Errors
    ///
    /// Returns `PermissionRepoError::NotFound` if the permission does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePermissionInput,
    ) -> Result<permissions::Model, PermissionRepoError> {
        let existing = self.get(id).await?;

        let mut permission: permissions::ActiveModel = existing.into();
        if let Some(name) = input.name {
            permission.name = Set(name);
        }
        if let Some(description) = input.description {
            permission.description = Set(description);
        }
        permission.updated_at = Set(chrono::Utc::now().into());

        Ok(permission.update(self.db.as_ref()).await?)
    }

    /// Deletes a permission. Role grants are removed by the FK cascade.
    ///
    /// # Errors
    ///
    /// Returns `PermissionRepoError::NotFound` if the permission does not exist.
    pub async fn delete(&self, id: Uuid) -> Result<(), PermissionRepoError> {
        let result = permissions::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(PermissionRepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Returns the IDs from `ids` that match no stored permission, in input order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn unknown_permission_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: std::collections::HashSet<Uuid> = permissions::Entity::find()
        .filter(permissions::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}
