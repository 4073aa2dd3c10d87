//! Role repository for database operations.
//!
//! Roles are tenant-scoped: every lookup takes the tenant ID, and a role of
//! another tenant is reported as not found.

use std::sync::Arc;

use bastion_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{role_permissions, roles, users};
use crate::error::db_error;
use crate::repositories::permission::unknown_permission_ids;

/// Error types for role operations.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    /// Role not found in the tenant.
    #[error("Role not found: {0}")]
    NotFound(Uuid),

    /// Role name already exists in the tenant.
    #[error("Role name '{0}' already exists")]
    DuplicateName(String),

    /// Change not allowed on a system role.
    #[error("System role cannot be {0}")]
    SystemRole(&'static str),

    /// Users are still assigned to the role.
    #[error("Role is assigned to {0} user(s)")]
    InUse(u64),

    /// Some permission IDs do not exist.
    #[error("Unknown permission id(s): {}", join_ids(.0))]
    UnknownPermissions(Vec<Uuid>),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub(crate) fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

impl From<RoleError> for AppError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::NotFound(_) => Self::NotFound(err.to_string()),
            RoleError::DuplicateName(_) | RoleError::InUse(_) => Self::Conflict(err.to_string()),
            RoleError::SystemRole(_) => Self::BusinessRule(err.to_string()),
            RoleError::UnknownPermissions(_) => Self::Validation(err.to_string()),
            RoleError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a role.
#[derive(Debug, Clone)]
pub struct CreateRoleInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Name, unique within the tenant.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Grants every permission.
    pub is_superuser: bool,
    /// Protected from edits through the API. Only the seeder sets this.
    pub is_system: bool,
    /// Permissions granted on creation.
    pub permission_ids: Vec<Uuid>,
}

/// Input for updating a role.
#[derive(Debug, Clone, Default)]
pub struct UpdateRoleInput {
    /// New name.
    pub name: Option<String>,
    /// Description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// Superuser flag.
    pub is_superuser: Option<bool>,
}

/// Role repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    db: Arc<DatabaseConnection>,
}

impl RoleRepository {
    /// Creates a new role repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists the roles of a tenant ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::TenantId.eq(tenant_id))
            .order_by_asc(roles::Column::Name)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a role by ID within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find_by_id(id)
            .filter(roles::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await
    }

    /// Gets a role by ID within a tenant.
    ///
    /// # Errors
    ///
    /// Returns `RoleError::NotFound` if the role does not exist in the tenant.
    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<roles::Model, RoleError> {
        self.find(tenant_id, id).await?.ok_or(RoleError::NotFound(id))
    }

    async fn name_taken(
        &self,
        tenant_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let mut query = roles::Entity::find()
            .filter(roles::Column::TenantId.eq(tenant_id))
            .filter(roles::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(roles::Column::Id.ne(id));
        }
        Ok(query.count(self.db.as_ref()).await? > 0)
    }

    /// Creates a role and grants its initial permissions in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is taken in the tenant
    /// - Any permission ID is unknown
    pub async fn create(&self, input: CreateRoleInput) -> Result<roles::Model, RoleError> {
        if self.name_taken(input.tenant_id, &input.name, None).await? {
            return Err(RoleError::DuplicateName(input.name));
        }

        let mut permission_ids = input.permission_ids;
        permission_ids.sort_unstable();
        permission_ids.dedup();

        let unknown = unknown_permission_ids(self.db.as_ref(), &permission_ids).await?;
        if !unknown.is_empty() {
            return Err(RoleError::UnknownPermissions(unknown));
        }

        let txn = self.db.begin().await?;

        let now = chrono::Utc::now().into();
        let role = roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(input.tenant_id),
            name: Set(input.name),
            description: Set(input.description),
            is_system: Set(input.is_system),
            is_superuser: Set(input.is_superuser),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if !permission_ids.is_empty() {
            let grants = permission_ids
                .into_iter()
                .map(|permission_id| role_permissions::ActiveModel {
                    role_id: Set(role.id),
                    permission_id: Set(permission_id),
                    created_at: Set(now),
                });
            role_permissions::Entity::insert_many(grants)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(role)
    }

    /// Updates a role.
    ///
    /// A system role keeps its name and superuser flag; only its description
    /// can change.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The role does not exist in the tenant
    /// - A protected field of a system role would change
    /// - The new name is taken in the tenant
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRoleInput,
    ) -> Result<roles::Model, RoleError> {
        let existing = self.get(tenant_id, id).await?;

        if existing.is_system {
            if input.name.as_ref().is_some_and(|n| *n != existing.name) {
                return Err(RoleError::SystemRole("renamed"));
            }
            if input.is_superuser.is_some_and(|s| s != existing.is_superuser) {
                return Err(RoleError::SystemRole("changed to or from superuser"));
            }
        }

        if let Some(name) = &input.name
            && *name != existing.name
            && self.name_taken(tenant_id, name, Some(id)).await?
        {
            return Err(RoleError::DuplicateName(name.clone()));
        }

        let mut role: roles::ActiveModel = existing.into();
        if let Some(name) = input.name {
            role.name = Set(name);
        }
        if let Some(description) = input.description {
            role.description = Set(description);
        }
        if let Some(is_superuser) = input.is_superuser {
            role.is_superuser = Set(is_superuser);
        }
        role.updated_at = Set(chrono::Utc::now().into());

        Ok(role.update(self.db.as_ref()).await?)
    }

    /// Deletes a role that is neither a system role nor assigned to users.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The role does not exist in the tenant
    /// - The role is a system role
    /// - Users are assigned to the role
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), RoleError> {
        let role = self.get(tenant_id, id).await?;
        if role.is_system {
            return Err(RoleError::SystemRole("deleted"));
        }

        let assigned = users::Entity::find()
            .filter(users::Column::RoleId.eq(id))
            .count(self.db.as_ref())
            .await?;
        if assigned > 0 {
            return Err(RoleError::InUse(assigned));
        }

        roles::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;
        Ok(())
    }
}
