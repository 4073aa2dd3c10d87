//! Tenant management routes.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use bastion_core::permission::catalog;
use bastion_db::{CreateTenantInput, TenantRepository, UpdateTenantInput};
use bastion_shared::contracts::tenants::{
    CreateTenantRequest, TenantResponse, UpdateTenantRequest,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ApiPath, ValidatedJson},
    middleware::CurrentUser,
    response::{ApiResponse, no_content},
};

/// Creates the tenant routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route(
            "/tenants/{id}",
            get(get_tenant).patch(update_tenant).delete(delete_tenant),
        )
}

/// GET `/tenants` - List every tenant.
async fn list_tenants(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> ApiResult<ApiResponse<Vec<TenantResponse>>> {
    auth.require(&[catalog::TENANTS_READ])?;

    let tenants = TenantRepository::new(state.db.clone()).list().await?;
    Ok(ApiResponse::ok(tenants.into_iter().map(Into::into).collect()))
}

/// POST `/tenants` - Create a tenant.
async fn create_tenant(
    State(state): State<AppState>,
    auth: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateTenantRequest>,
) -> ApiResult<ApiResponse<TenantResponse>> {
    auth.require(&[catalog::TENANTS_CREATE])?;

    let tenant = TenantRepository::new(state.db.clone())
        .create(CreateTenantInput {
            name: payload.name.trim().to_string(),
            slug: payload.slug,
            is_active: true,
        })
        .await?;

    info!(tenant_id = %tenant.id, slug = %tenant.slug, created_by = %auth.user_id, "Tenant created");
    Ok(ApiResponse::created(tenant.into()))
}

/// GET `/tenants/{id}` - Get a tenant.
async fn get_tenant(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<TenantResponse>> {
    auth.require(&[catalog::TENANTS_READ])?;

    let tenant = TenantRepository::new(state.db.clone()).get(id).await?;
    Ok(ApiResponse::ok(tenant.into()))
}

/// PATCH `/tenants/{id}` - Rename or (de)activate a tenant.
async fn update_tenant(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTenantRequest>,
) -> ApiResult<ApiResponse<TenantResponse>> {
    auth.require(&[catalog::TENANTS_UPDATE])?;

    if payload.is_empty() {
        return Err(ApiError::validation("At least one field must be provided"));
    }
    if id == auth.tenant_id && payload.is_active == Some(false) {
        return Err(ApiError::business_rule("Cannot deactivate your own tenant"));
    }

    let tenant = TenantRepository::new(state.db.clone())
        .update(
            id,
            UpdateTenantInput {
                name: payload.name.map(|n| n.trim().to_string()),
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(tenant_id = %tenant.id, updated_by = %auth.user_id, "Tenant updated");
    Ok(ApiResponse::ok(tenant.into()))
}

/// DELETE `/tenants/{id}` - Delete a tenant that has no users left.
async fn delete_tenant(
    State(state): State<AppState>,
    auth: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(&[catalog::TENANTS_DELETE])?;

    if id == auth.tenant_id {
        return Err(ApiError::business_rule("Cannot delete your own tenant"));
    }

    TenantRepository::new(state.db.clone()).delete(id).await?;

    info!(tenant_id = %id, deleted_by = %auth.user_id, "Tenant deleted");
    Ok(no_content())
}
