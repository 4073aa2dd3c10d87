//! Tenant repository for database operations.

use std::sync::Arc;

use bastion_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{tenants, users};
use crate::error::db_error;

/// Error types for tenant operations.
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    /// Tenant not found.
    #[error("Tenant not found: {0}")]
    NotFound(Uuid),

    /// Slug is taken by another tenant.
    #[error("Tenant slug '{0}' already exists")]
    DuplicateSlug(String),

    /// Tenant still owns users.
    #[error("Tenant still has {0} user(s)")]
    HasUsers(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TenantError> for AppError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::NotFound(_) => Self::NotFound(err.to_string()),
            TenantError::DuplicateSlug(_) | TenantError::HasUsers(_) => {
                Self::Conflict(err.to_string())
            }
            TenantError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a tenant.
#[derive(Debug, Clone)]
pub struct CreateTenantInput {
    /// Display name.
    pub name: String,
    /// URL-safe unique slug.
    pub slug: String,
    /// Whether the tenant can log in.
    pub is_active: bool,
}

/// Input for updating a tenant.
#[derive(Debug, Clone, Default)]
pub struct UpdateTenantInput {
    /// Display name.
    pub name: Option<String>,
    /// Whether the tenant can log in.
    pub is_active: Option<bool>,
}

/// Tenant repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: Arc<DatabaseConnection>,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists every tenant ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<tenants::Model>, DbErr> {
        tenants::Entity::find()
            .order_by_asc(tenants::Column::Name)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find_by_id(id).one(self.db.as_ref()).await
    }

    /// Finds a tenant by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find()
            .filter(tenants::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
    }

    /// Gets a tenant by ID or fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `TenantError::NotFound` if no tenant has this ID.
    pub async fn get(&self, id: Uuid) -> Result<tenants::Model, TenantError> {
        self.find_by_id(id).await?.ok_or(TenantError::NotFound(id))
    }

    /// Creates a tenant.
    ///
    /// # Errors
    ///
    /// Returns `TenantError::DuplicateSlug` if the slug is taken.
    pub async fn create(&self, input: CreateTenantInput) -> Result<tenants::Model, TenantError> {
        if self.find_by_slug(&input.slug).await?.is_some() {
            return Err(TenantError::DuplicateSlug(input.slug));
        }

        let now = chrono::Utc::now().into();
        let tenant = tenants::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(input.slug),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(tenant.insert(self.db.as_ref()).await?)
    }

    /// Updates a tenant's name or active flag.
    ///
    /// # Errors
    ///
    /// Returns `TenantError::NotFound` if the tenant does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTenantInput,
    ) -> Result<tenants::Model, TenantError> {
        let existing = self.get(id).await?;

        let mut tenant: tenants::ActiveModel = existing.into();
        if let Some(name) = input.name {
            tenant.name = Set(name);
        }
        if let Some(is_active) = input.is_active {
            tenant.is_active = Set(is_active);
        }
        tenant.updated_at = Set(chrono::Utc::now().into());

        Ok(tenant.update(self.db.as_ref()).await?)
    }

    /// Deletes a tenant that no longer owns users.
    ///
    /// Roles and sessions of the tenant go with it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The tenant does not exist
    /// - The tenant still has users
    pub async fn delete(&self, id: Uuid) -> Result<(), TenantError> {
        self.get(id).await?;

        let user_count = users::Entity::find()
            .filter(users::Column::TenantId.eq(id))
            .count(self.db.as_ref())
            .await?;
        if user_count > 0 {
            return Err(TenantError::HasUsers(user_count));
        }

        tenants::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;
        Ok(())
    }
}
