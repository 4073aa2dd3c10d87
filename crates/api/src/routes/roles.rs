//! Role management routes, scoped to the caller's tenant.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use bastion_core::permission::catalog;
use bastion_db::{CreateRoleInput, RoleRepository, UpdateRoleInput};
use bastion_shared::contracts::roles::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ApiPath, ValidatedJson},
    middleware::CurrentUser,
    response::{ApiResponse, no_content},
};

/// Creates the role routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/{id}",
            get(get_role).patch(update_role).delete(delete_role),
        )
}

/// GET `/roles` - List the roles of the caller's tenant.
async fn list_roles(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> ApiResult<ApiResponse<Vec<RoleResponse>>> {
    auth.require(&[catalog::ROLES_READ])?;

    let roles = RoleRepository::new(state.db.clone())
        .list(auth.tenant_id)
        .await?;
    Ok(ApiResponse::ok(roles.into_iter().map(Into::into).collect()))
}

/// POST `/roles` - Create a role, optionally with initial permissions.
///
/// Granting permissions at creation also needs `role_permissions.update`;
/// a superuser role can only be created by a superuser.
async fn create_role(
    State(state): State<AppState>,
    auth: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateRoleRequest>,
) -> ApiResult<ApiResponse<RoleResponse>> {
    auth.require(&[catalog::ROLES_CREATE])?;
    if payload.is_superuser {
        auth.require_superuser("create a superuser role")?;
    }
    if !payload.permission_ids.is_empty() {
        auth.require(&[catalog::ROLE_PERMISSIONS_UPDATE])?;
    }

    let role = RoleRepository::new(state.db.clone())
        .create(CreateRoleInput {
            tenant_id: auth.tenant_id,
            name: payload.name.trim().to_string(),
            description: payload.description,
            is_superuser: payload.is_superuser,
            is_system: false,
            permission_ids: payload.permission_ids,
        })
        .await?;

    info!(
        role_id = %role.id,
        tenant_id = %role.tenant_id,
        superuser = role.is_superuser,
        "Role created"
    );
    Ok(ApiResponse::created(role.into()))
}

/// GET `/roles/{id}` - Get a role.
async fn get_role(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<RoleResponse>> {
    auth.require(&[catalog::ROLES_READ])?;

    let role = RoleRepository::new(state.db.clone())
        .get(auth.tenant_id, id)
        .await?;
    Ok(ApiResponse::ok(role.into()))
}

/// PATCH `/roles/{id}` - Update a role.
async fn update_role(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<ApiResponse<RoleResponse>> {
    auth.require(&[catalog::ROLES_UPDATE])?;

    if payload.is_empty() {
        return Err(ApiError::validation("At least one field must be provided"));
    }
    if payload.is_superuser.is_some() {
        auth.require_superuser("change the superuser flag")?;
    }

    let role = RoleRepository::new(state.db.clone())
        .update(
            auth.tenant_id,
            id,
            UpdateRoleInput {
                name: payload.name.map(|n| n.trim().to_string()),
                description: payload.description,
                is_superuser: payload.is_superuser,
            },
        )
        .await?;

    info!(role_id = %role.id, updated_by = %auth.user_id, "Role updated");
    Ok(ApiResponse::ok(role.into()))
}

/// DELETE `/roles/{id}` - Delete an unassigned, non-system role.
async fn delete_role(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::ROLES_DELETE])?;

    if auth.role_id == Some(id) {
        return Err(ApiError::business_rule("Cannot delete your own role"));
    }

    RoleRepository::new(state.db.clone())
        .delete(auth.tenant_id, id)
        .await?;

    info!(role_id = %id, deleted_by = %auth.user_id, "Role deleted");
    Ok(no_content())
}
