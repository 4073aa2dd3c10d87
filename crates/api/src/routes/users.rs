//! User management routes, scoped to the caller's tenant.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use bastion_core::{auth::hash_password, permission::catalog};
use bastion_db::{CreateUserInput, RoleRepository, UpdateUserInput, UserFilter, UserRepository};
use bastion_shared::contracts::{
    normalize_email,
    users::{CreateUserRequest, UpdateUserRequest, UserQuery, UserResponse},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ApiPath, ApiQuery, ValidatedJson},
    middleware::CurrentUser,
    response::{ApiResponse, no_content},
};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Rejects handing a superuser role to anyone unless the caller is one.
async fn ensure_role_assignable(
    state: &AppState,
    auth: &CurrentUser,
    role_id: Option<Uuid>,
) -> ApiResult<()> {
    let Some(role_id) = role_id else {
        return Ok(());
    };
    if auth.permissions.is_superuser() {
        return Ok(());
    }
    let role = RoleRepository::new(state.db.clone())
        .find(auth.tenant_id, role_id)
        .await?;
    if role.is_some_and(|r| r.is_superuser) {
        auth.require_superuser("assign a superuser role")?;
    }
    Ok(())
}

/// GET `/users` - List users, filtered by `?role_id=` and `?active=`.
async fn list_users(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<Vec<UserResponse>>> {
    auth.require(&[catalog::USERS_READ])?;

    let users = UserRepository::new(state.db.clone())
        .list(
            auth.tenant_id,
            UserFilter {
                role_id: query.role_id,
                is_active: query.active,
            },
        )
        .await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// POST `/users` - Create a user in the caller's tenant.
async fn create_user(
    State(state): State<AppState>,
    auth: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<ApiResponse<UserResponse>> {
    auth.require(&[catalog::USERS_CREATE])?;
    ensure_role_assignable(&state, &auth, payload.role_id).await?;

    let password_hash = hash_password(&payload.password)?;
    let user = UserRepository::new(state.db.clone())
        .create(CreateUserInput {
            tenant_id: auth.tenant_id,
            email: normalize_email(&payload.email),
            password_hash,
            full_name: payload.full_name.trim().to_string(),
            role_id: payload.role_id,
            is_active: payload.is_active,
        })
        .await?;

    info!(user_id = %user.id, tenant_id = %user.tenant_id, created_by = %auth.user_id, "User created");
    Ok(ApiResponse::created(user.into()))
}

/// GET `/users/{id}` - Get a user.
async fn get_user(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<UserResponse>> {
    auth.require(&[catalog::USERS_READ])?;

    let user = UserRepository::new(state.db.clone())
        .get(auth.tenant_id, id)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// PATCH `/users/{id}` - Update a user.
///
/// Deactivating a user or changing the password revokes every session.
async fn update_user(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<ApiResponse<UserResponse>> {
    auth.require(&[catalog::USERS_UPDATE])?;

    if payload.is_empty() {
        return Err(ApiError::validation("At least one field must be provided"));
    }
    if id == auth.user_id && payload.is_active == Some(false) {
        return Err(ApiError::business_rule("Cannot deactivate yourself"));
    }
    ensure_role_assignable(&state, &auth, payload.role_id.flatten()).await?;

    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let input = UpdateUserInput {
        email: payload.email.as_deref().map(normalize_email),
        full_name: payload.full_name.map(|n| n.trim().to_string()),
        password_hash,
        role_id: payload.role_id,
        is_active: payload.is_active,
    };
    let revokes_sessions = input.revokes_sessions();

    let user = UserRepository::new(state.db.clone())
        .update(auth.tenant_id, id, input)
        .await?;

    info!(
        user_id = %user.id,
        updated_by = %auth.user_id,
        sessions_revoked = revokes_sessions,
        "User updated"
    );
    Ok(ApiResponse::ok(user.into()))
}

/// DELETE `/users/{id}` - Delete a user and their sessions.
async fn delete_user(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::USERS_DELETE])?;

    if id == auth.user_id {
        return Err(ApiError::business_rule("Cannot delete yourself"));
    }

    UserRepository::new(state.db.clone())
        .delete(auth.tenant_id, id)
        .await?;

    info!(user_id = %id, deleted_by = %auth.user_id, "User deleted");
    Ok(no_content())
}
