//! Authentication guard for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use bastion_core::permission::{PermissionSet, Requirement, ensure};
use bastion_db::{RolePermissionRepository, RoleRepository, TenantRepository, UserRepository};
use bastion_shared::TokenKind;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// The authenticated caller, resolved once per request by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID.
    pub user_id: Uuid,
    /// Tenant the request is scoped to.
    pub tenant_id: Uuid,
    /// Session the access token was issued for.
    pub session_id: Uuid,
    /// Normalized email.
    pub email: String,
    /// Assigned role, if any.
    pub role_id: Option<Uuid>,
    /// Effective permissions of the role.
    pub permissions: PermissionSet,
}

impl CurrentUser {
    /// Requires every listed permission.
    ///
    /// # Errors
    ///
    /// Returns a 403 naming the missing permissions.
    pub fn require(&self, codes: &[&str]) -> Result<(), ApiError> {
        ensure(&self.permissions, Requirement::All(codes)).map_err(|err| {
            tracing::debug!(user_id = %self.user_id, error = %err, "Permission denied");
            err.into()
        })
    }

    /// Requires at least one of the listed permissions.
    ///
    /// # Errors
    ///
    /// Returns a 403 naming the candidate permissions.
    pub fn require_any(&self, codes: &[&str]) -> Result<(), ApiError> {
        ensure(&self.permissions, Requirement::Any(codes)).map_err(|err| {
            tracing::debug!(user_id = %self.user_id, error = %err, "Permission denied");
            err.into()
        })
    }

    /// Requires a superuser role. Guards everything that would hand out
    /// superuser rights, which no single permission may grant.
    ///
    /// # Errors
    ///
    /// Returns a 403 when the caller is not a superuser.
    pub fn require_superuser(&self, action: &str) -> Result<(), ApiError> {
        if self.permissions.is_superuser() {
            return Ok(());
        }
        tracing::warn!(user_id = %self.user_id, action, "Superuser action denied");
        Err(ApiError::forbidden(format!("Only a superuser can {action}")))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates it as an access token
/// 3. Loads the user (must exist in the token's tenant and be active)
/// 4. Loads the tenant (must be active)
/// 5. Resolves the permission set of the user's role
/// 6. Stores a [`CurrentUser`] in request extensions for handlers to access
///
/// # Errors
///
/// Returns 401 for steps 1-3 and 403 for step 4.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| {
            ApiError::unauthorized("Authorization header with Bearer token is required")
        })?;

    let claims = state
        .jwt_service
        .validate_token_kind(token, TokenKind::Access)?;

    let db = state.db.clone();
    let user = UserRepository::new(db.clone())
        .find(claims.tenant_id(), claims.user_id())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    let tenant_active = TenantRepository::new(db.clone())
        .find_by_id(user.tenant_id)
        .await?
        .is_some_and(|t| t.is_active);
    if !tenant_active {
        return Err(ApiError::forbidden("Tenant is inactive"));
    }

    let role = match user.role_id {
        Some(role_id) => RoleRepository::new(db.clone()).find(user.tenant_id, role_id).await?,
        None => None,
    };
    let permissions = RolePermissionRepository::new(db)
        .permission_set(role.as_ref())
        .await?;

    request.extensions_mut().insert(CurrentUser {
        user_id: user.id,
        tenant_id: user.tenant_id,
        session_id: claims.session_id(),
        email: user.email,
        role_id: user.role_id,
        permissions,
    });

    Ok(next.run(request).await)
}
