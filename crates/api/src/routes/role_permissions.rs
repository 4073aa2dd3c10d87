//! Routes managing the permissions granted to a role.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use bastion_core::permission::catalog;
use bastion_db::RolePermissionRepository;
use bastion_shared::contracts::roles::{RolePermissionsResponse, SetRolePermissionsRequest};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiPath, ValidatedJson},
    middleware::CurrentUser,
    response::{ApiResponse, no_content},
};

/// Creates the role-permission routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/roles/{id}/permissions",
            get(list_role_permissions).put(replace_role_permissions),
        )
        .route(
            "/roles/{id}/permissions/{permission_id}",
            post(grant_permission).delete(revoke_permission),
        )
}

/// GET `/roles/{id}/permissions` - Permissions granted to a role.
async fn list_role_permissions(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(role_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<RolePermissionsResponse>> {
    auth.require(&[catalog::ROLE_PERMISSIONS_READ])?;

    let permissions = RolePermissionRepository::new(state.db.clone())
        .list(auth.tenant_id, role_id)
        .await?;
    Ok(ApiResponse::ok(RolePermissionsResponse {
        role_id,
        permissions: permissions.into_iter().map(Into::into).collect(),
    }))
}

/// PUT `/roles/{id}/permissions` - Replace the full permission set of a role.
async fn replace_role_permissions(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(role_id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetRolePermissionsRequest>,
) -> ApiResult<ApiResponse<RolePermissionsResponse>> {
    auth.require(&[catalog::ROLE_PERMISSIONS_UPDATE])?;

    let permissions = RolePermissionRepository::new(state.db.clone())
        .replace(auth.tenant_id, role_id, &payload.permission_ids)
        .await?;

    info!(
        role_id = %role_id,
        count = permissions.len(),
        updated_by = %auth.user_id,
        "Role permissions replaced"
    );
    Ok(ApiResponse::ok(RolePermissionsResponse {
        role_id,
        permissions: permissions.into_iter().map(Into::into).collect(),
    }))
}

/// POST `/roles/{id}/permissions/{permission_id}` - Grant one permission.
///
/// Granting a permission the role already holds succeeds.
async fn grant_permission(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath((role_id, permission_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::ROLE_PERMISSIONS_UPDATE])?;

    let granted = RolePermissionRepository::new(state.db.clone())
        .grant(auth.tenant_id, role_id, permission_id)
        .await?;

    if granted {
        info!(role_id = %role_id, permission_id = %permission_id, "Permission granted");
    }
    Ok(no_content())
}

/// DELETE `/roles/{id}/permissions/{permission_id}` - Revoke one permission.
async fn revoke_permission(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath((role_id, permission_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::ROLE_PERMISSIONS_UPDATE])?;

    RolePermissionRepository::new(state.db.clone())
        .revoke(auth.tenant_id, role_id, permission_id)
        .await?;

    info!(role_id = %role_id, permission_id = %permission_id, "Permission revoked");
    Ok(no_content())
}
