//! Module catalog routes.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use bastion_core::permission::catalog;
use bastion_db::{CreateModuleInput, ModuleFilter, ModuleRepository, UpdateModuleInput};
use bastion_shared::contracts::modules::{
    CreateModuleRequest, ModuleQuery, ModuleResponse, UpdateModuleRequest,
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

/// Creates the module routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_modules).post(create_module))
        .route(
            "/modules/{id}",
            get(get_module).patch(update_module).delete(delete_module),
        )
}

/// GET `/modules` - List modules, optionally filtered by `?active=`.
async fn list_modules(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiQuery(query): ApiQuery<ModuleQuery>,
) -> ApiResult<ApiResponse<Vec<ModuleResponse>>> {
    auth.require(&[catalog::MODULES_READ])?;

    let modules = ModuleRepository::new(state.db.clone())
        .list(ModuleFilter {
            is_active: query.active,
        })
        .await?;
    Ok(ApiResponse::ok(modules.into_iter().map(Into::into).collect()))
}

/// POST `/modules` - Create a module.
async fn create_module(
    State(state): State<AppState>,
    auth: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateModuleRequest>,
) -> ApiResult<ApiResponse<ModuleResponse>> {
    auth.require(&[catalog::MODULES_CREATE])?;

    let module = ModuleRepository::new(state.db.clone())
        .create(CreateModuleInput {
            code: payload.code,
            name: payload.name.trim().to_string(),
            description: payload.description,
            sort_order: payload.sort_order,
            is_active: payload.is_active,
        })
        .await?;

    info!(module_id = %module.id, code = %module.code, "Module created");
    Ok(ApiResponse::created(module.into()))
}

/// GET `/modules/{id}` - Get a module.
async fn get_module(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<ModuleResponse>> {
    auth.require(&[catalog::MODULES_READ])?;

    let module = ModuleRepository::new(state.db.clone()).get(id).await?;
    Ok(ApiResponse::ok(module.into()))
}

/// PATCH `/modules/{id}` - Update a module. The code is immutable.
async fn update_module(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateModuleRequest>,
) -> ApiResult<ApiResponse<ModuleResponse>> {
    auth.require(&[catalog::MODULES_UPDATE])?;

    if payload.is_empty() {
        return Err(ApiError::validation("At least one field must be provided"));
    }

    let module = ModuleRepository::new(state.db.clone())
        .update(
            id,
            UpdateModuleInput {
                name: payload.name.map(|n| n.trim().to_string()),
                description: payload.description,
                sort_order: payload.sort_order,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(module_id = %module.id, "Module updated");
    Ok(ApiResponse::ok(module.into()))
}

/// DELETE `/modules/{id}` - Delete a module without permissions.
async fn delete_module(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::MODULES_DELETE])?;

    ModuleRepository::new(state.db.clone()).delete(id).await?;

    info!(module_id = %id, deleted_by = %auth.user_id, "Module deleted");
    Ok(no_content())
}
