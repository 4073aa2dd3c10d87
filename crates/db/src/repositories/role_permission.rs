//! Role-permission association repository.
//!
//! Also resolves the effective [`PermissionSet`] of a role, which is what the
//! HTTP guard checks requirements against.

use std::sync::Arc;

use bastion_core::permission::PermissionSet;
use bastion_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{permissions, role_permissions, roles};
use crate::error::db_error;
use crate::repositories::permission::unknown_permission_ids;
use crate::repositories::role::join_ids;

/// Error types for role-permission operations.
#[derive(Debug, thiserror::Error)]
pub enum RolePermissionError {
    /// Role not found in the tenant.
    #[error("Role not found: {0}")]
    RoleNotFound(Uuid),

    /// Permission not found.
    #[error("Permission not found: {0}")]
    PermissionNotFound(Uuid),

    /// The role does not hold the permission.
    #[error("Permission {permission_id} is not granted to role {role_id}")]
    NotGranted {
        /// Role.
        role_id: Uuid,
        /// Permission.
        permission_id: Uuid,
    },

    /// Some permission IDs do not exist.
    #[error("Unknown permission id(s): {}", join_ids(.0))]
    UnknownPermissions(Vec<Uuid>),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<RolePermissionError> for AppError {
    fn from(err: RolePermissionError) -> Self {
        match err {
            RolePermissionError::RoleNotFound(_)
            | RolePermissionError::PermissionNotFound(_)
            | RolePermissionError::NotGranted { .. } => Self::NotFound(err.to_string()),
            RolePermissionError::UnknownPermissions(_) => Self::Validation(err.to_string()),
            RolePermissionError::Database(e) => db_error(e),
        }
    }
}

/// Repository for the permissions granted to roles.
#[derive(Debug, Clone)]
pub struct RolePermissionRepository {
    db: Arc<DatabaseConnection>,
}

impl RolePermissionRepository {
    /// Creates a new role-permission repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    async fn role_in_tenant(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<roles::Model, RolePermissionError> {
        roles::Entity::find_by_id(role_id)
            .filter(roles::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(RolePermissionError::RoleNotFound(role_id))
    }

    async fn permissions_of(&self, role_id: Uuid) -> Result<Vec<permissions::Model>, DbErr> {
        permissions::Entity::find()
            .join(
                JoinType::InnerJoin,
                permissions::Relation::RolePermissions.def(),
            )
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .order_by_asc(permissions::Column::Code)
            .all(self.db.as_ref())
            .await
    }

    /// Lists the permissions granted to a role, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `RolePermissionError::RoleNotFound` if the role is not in the tenant.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<Vec<permissions::Model>, RolePermissionError> {
        self.role_in_tenant(tenant_id, role_id).await?;
        Ok(self.permissions_of(role_id).await?)
    }

    /// Replaces the full set of permissions granted to a role.
    ///
    /// Duplicate IDs in the input are ignored. Returns the new grants.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The role is not in the tenant
    /// - Any permission ID is unknown
    pub async fn replace(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<permissions::Model>, RolePermissionError> {
        self.role_in_tenant(tenant_id, role_id).await?;

        let mut ids = permission_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let unknown = unknown_permission_ids(self.db.as_ref(), &ids).await?;
        if !unknown.is_empty() {
            return Err(RolePermissionError::UnknownPermissions(unknown));
        }

        let txn = self.db.begin().await?;

        role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        if !ids.is_empty() {
            let now = chrono::Utc::now().into();
            let grants = ids
                .into_iter()
                .map(|permission_id| role_permissions::ActiveModel {
                    role_id: Set(role_id),
                    permission_id: Set(permission_id),
                    created_at: Set(now),
                });
            role_permissions::Entity::insert_many(grants)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        Ok(self.permissions_of(role_id).await?)
    }

    /// Grants one permission to a role. Granting an existing grant is a no-op.
    ///
    /// Returns `true` when a new grant was recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the role is not in the tenant or the permission
    /// does not exist.
    pub async fn grant(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, RolePermissionError> {
        self.role_in_tenant(tenant_id, role_id).await?;

        permissions::Entity::find_by_id(permission_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RolePermissionError::PermissionNotFound(permission_id))?;

        let existing = role_permissions::Entity::find_by_id((role_id, permission_id))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        role_permissions::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(true)
    }

    /// Revokes one permission from a role.
    ///
    /// # Errors
    ///
    /// Returns `RolePermissionError::NotGranted` if the role does not hold it.
    pub async fn revoke(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), RolePermissionError> {
        self.role_in_tenant(tenant_id, role_id).await?;

        let result = role_permissions::Entity::delete_by_id((role_id, permission_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RolePermissionError::NotGranted {
                role_id,
                permission_id,
            });
        }
        Ok(())
    }

    /// Resolves the permission set a role grants.
    ///
    /// A superuser role grants everything; no role grants nothing. Stored
    /// codes that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn permission_set(&self, role: Option<&roles::Model>) -> Result<PermissionSet, DbErr> {
        let Some(role) = role else {
            return Ok(PermissionSet::empty());
        };
        if role.is_superuser {
            return Ok(PermissionSet::superuser());
        }

        let codes: Vec<String> = permissions::Entity::find()
            .select_only()
            .column(permissions::Column::Code)
            .join(
                JoinType::InnerJoin,
                permissions::Relation::RolePermissions.def(),
            )
            .filter(role_permissions::Column::RoleId.eq(role.id))
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let (set, rejected) = PermissionSet::from_codes(&codes);
        if !rejected.is_empty() {
            tracing::warn!(role_id = %role.id, codes = ?rejected, "Ignoring malformed permission codes");
        }
        Ok(set)
    }
}
