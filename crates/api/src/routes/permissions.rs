//! Permission catalog routes.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use bastion_core::permission::catalog;
use bastion_db::{CreatePermissionInput, PermissionRepository, UpdatePermissionInput};
use bastion_shared::contracts::permissions::{
    CreatePermissionRequest, PermissionQuery, PermissionResponse, UpdatePermissionRequest,
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

/// Creates the permission routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/permissions", get(list_permissions).post(create_permission))
        .route(
            "/permissions/{id}",
            get(get_permission)
                .patch(update_permission)
                .delete(delete_permission),
        )
}

/// GET `/permissions` - List permissions, optionally for one `?module_id=`.
async fn list_permissions(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiQuery(query): ApiQuery<PermissionQuery>,
) -> ApiResult<ApiResponse<Vec<PermissionResponse>>> {
    auth.require(&[catalog::PERMISSIONS_READ])?;

    let permissions = PermissionRepository::new(state.db.clone())
        .list(query.module_id)
        .await?;
    Ok(ApiResponse::ok(
        permissions.into_iter().map(Into::into).collect(),
    ))
}

/// POST `/permissions` - Create a permission under a module.
async fn create_permission(
    State(state): State<AppState>,
    auth: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreatePermissionRequest>,
) -> ApiResult<ApiResponse<PermissionResponse>> {
    auth.require(&[catalog::PERMISSIONS_CREATE])?;

    let permission = PermissionRepository::new(state.db.clone())
        .create(CreatePermissionInput {
            module_id: payload.module_id,
            code: payload.code,
            name: payload.name.trim().to_string(),
            description: payload.description,
        })
        .await?;

    info!(permission_id = %permission.id, code = %permission.code, "Permission created");
    Ok(ApiResponse::created(permission.into()))
}

/// GET `/permissions/{id}` - Get a permission.
async fn get_permission(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<PermissionResponse>> {
    auth.require(&[catalog::PERMISSIONS_READ])?;

    let permission = PermissionRepository::new(state.db.clone())
        .get(id)
        .await?;
    Ok(ApiResponse::ok(permission.into()))
}

/// PATCH `/permissions/{id}` - Update name or description.
async fn update_permission(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePermissionRequest>,
) -> ApiResult<ApiResponse<PermissionResponse>> {
    auth.require(&[catalog::PERMISSIONS_UPDATE])?;

    if payload.is_empty() {
        return Err(ApiError::validation("At least one field must be provided"));
    }

    let permission = PermissionRepository::new(state.db.clone())
        .update(
            id,
            UpdatePermissionInput {
                name: payload.name.map(|n| n.trim().to_string()),
                description: payload.description,
            },
        )
        .await?;

    info!(permission_id = %permission.id, "Permission updated");
    Ok(ApiResponse::ok(permission.into()))
}

/// DELETE `/permissions/{id}` - Delete a permission and every grant of it.
async fn delete_permission(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::PERMISSIONS_DELETE])?;

    PermissionRepository::new(state.db.clone())
        .delete(id)
        .await?;

    info!(permission_id = %id, deleted_by = %auth.user_id, "Permission deleted");
    Ok(no_content())
}
