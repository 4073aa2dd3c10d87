//! User repository for database operations.

use std::sync::Arc;

use bastion_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{roles, users};
use crate::error::db_error;
use crate::repositories::session::revoke_all_for_user;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found in the tenant.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Email already registered in the tenant.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// Role does not exist in the user's tenant.
    #[error("Role {0} does not belong to this tenant")]
    RoleNotInTenant(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::DuplicateEmail(_) => Self::Conflict(err.to_string()),
            UserError::RoleNotInTenant(_) => Self::Validation(err.to_string()),
            UserError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a user. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Normalized email.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Full name.
    pub full_name: String,
    /// Assigned role.
    pub role_id: Option<Uuid>,
    /// Whether the user can log in.
    pub is_active: bool,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Normalized email.
    pub email: Option<String>,
    /// Full name.
    pub full_name: Option<String>,
    /// New Argon2id PHC string.
    pub password_hash: Option<String>,
    /// Role (`Some(None)` unassigns it).
    pub role_id: Option<Option<Uuid>>,
    /// Whether the user can log in.
    pub is_active: Option<bool>,
}

impl UpdateUserInput {
    /// True when applying this update must end the user's sessions.
    #[must_use]
    pub const fn revokes_sessions(&self) -> bool {
        self.password_hash.is_some() || matches!(self.is_active, Some(false))
    }
}

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Filter by role.
    pub role_id: Option<Uuid>,
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    /// Lists the users of a tenant ordered by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: UserFilter,
    ) -> Result<Vec<users::Model>, DbErr> {
        let mut query = users::Entity::find().filter(users::Column::TenantId.eq(tenant_id));
        if let Some(role_id) = filter.role_id {
            query = query.filter(users::Column::RoleId.eq(role_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(users::Column::IsActive.eq(is_active));
        }

        query
            .order_by_asc(users::Column::Email)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a user by ID within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await
    }

    /// Gets a user by ID within a tenant.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the user is not in the tenant.
    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<users::Model, UserError> {
        self.find(tenant_id, id).await?.ok_or(UserError::NotFound(id))
    }

    /// Finds a user by normalized email within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::TenantId.eq(tenant_id))
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
    }

    async fn ensure_role_in_tenant(&self, tenant_id: Uuid, role_id: Uuid) -> Result<(), UserError> {
        let count = roles::Entity::find_by_id(role_id)
            .filter(roles::Column::TenantId.eq(tenant_id))
            .count(self.db.as_ref())
            .await?;
        if count == 0 {
            return Err(UserError::RoleNotInTenant(role_id));
        }
        Ok(())
    }

    async fn ensure_email_free(
        &self,
        tenant_id: Uuid,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), UserError> {
        let mut query = users::Entity::find()
            .filter(users::Column::TenantId.eq(tenant_id))
            .filter(users::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        if query.count(self.db.as_ref()).await? > 0 {
            return Err(UserError::DuplicateEmail(email.to_string()));
        }
        Ok(())
    }

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The email is taken in the tenant
    /// - The role is not in the tenant
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        self.ensure_email_free(input.tenant_id, &input.email, None)
            .await?;
        if let Some(role_id) = input.role_id {
            self.ensure_role_in_tenant(input.tenant_id, role_id).await?;
        }

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(input.tenant_id),
            role_id: Set(input.role_id),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            full_name: Set(input.full_name),
            is_active: Set(input.is_active),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(user.insert(self.db.as_ref()).await?)
    }

    /// Updates a user.
    ///
    /// Deactivation and password changes revoke the user's sessions in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user is not in the tenant
    /// - The new email is taken in the tenant
    /// - The new role is not in the tenant
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let existing = self.get(tenant_id, id).await?;

        if let Some(email) = &input.email
            && *email != existing.email
        {
            self.ensure_email_free(tenant_id, email, Some(id)).await?;
        }
        if let Some(Some(role_id)) = input.role_id {
            self.ensure_role_in_tenant(tenant_id, role_id).await?;
        }

        let revoke = input.revokes_sessions();
        let now = chrono::Utc::now();

        let mut user: users::ActiveModel = existing.into();
        if let Some(email) = input.email {
            user.email = Set(email);
        }
        if let Some(full_name) = input.full_name {
            user.full_name = Set(full_name);
        }
        if let Some(password_hash) = input.password_hash {
            user.password_hash = Set(password_hash);
        }
        if let Some(role_id) = input.role_id {
            user.role_id = Set(role_id);
        }
        if let Some(is_active) = input.is_active {
            user.is_active = Set(is_active);
        }
        user.updated_at = Set(now.into());

        let txn = self.db.begin().await?;
        let updated = user.update(&txn).await?;
        if revoke {
            let revoked = revoke_all_for_user(&txn, id, now).await?;
            tracing::info!(user_id = %id, revoked, "Revoked sessions after user update");
        }
        txn.commit().await?;

        Ok(updated)
    }

    /// Deletes a user. Sessions are removed by the FK cascade.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the user is not in the tenant.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), UserError> {
        let result = users::Entity::delete_many()
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::TenantId.eq(tenant_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    /// Records a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn record_login(&self, id: Uuid) -> Result<(), DbErr> {
        users::Entity::update_many()
            .col_expr(
                users::Column::LastLoginAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now()),
            )
            .filter(users::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        Ok(())
    }
}
