//! Authentication routes: login, token refresh, logout and the current user.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    routing::{get, post},
};
use bastion_core::auth::{verify_dummy, verify_password};
use bastion_db::{
    RolePermissionRepository, RoleRepository, SessionRepository, TenantRepository, UserRepository,
    entities::users,
    repositories::NewSession,
};
use bastion_shared::{
    TokenKind, TokenPair,
    contracts::{
        auth::{
            EffectivePermissions, LoginRequest, LoginResponse, LogoutRequest, MeResponse,
            RefreshRequest,
        },
        normalize_email,
    },
};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::CurrentUser,
    response::{ApiResponse, no_content},
};

const INVALID_CREDENTIALS: &str = "Invalid tenant, email or password";

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// Routes behind the auth guard.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Client metadata recorded on the session.
struct ClientInfo {
    user_agent: Option<String>,
    ip_address: Option<String>,
}

impl ClientInfo {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self {
            user_agent: header(USER_AGENT.as_str()).map(|ua| ua.chars().take(512).collect()),
            ip_address: header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .or_else(|| header("x-real-ip"))
                .map(|ip| ip.trim().chars().take(45).collect()),
        }
    }
}

/// Issues a token pair for a new session ID.
fn issue_tokens(
    state: &AppState,
    user: &users::Model,
    session_id: Uuid,
) -> ApiResult<(TokenPair, chrono::DateTime<chrono::Utc>)> {
    let access = state
        .jwt_service
        .generate_access_token(user.id, user.tenant_id, session_id)?;
    let refresh = state
        .jwt_service
        .generate_refresh_token(user.id, user.tenant_id, session_id)?;

    Ok((
        TokenPair::new(
            access.token,
            refresh.token,
            state.jwt_service.access_token_expires_in(),
        ),
        refresh.expires_at,
    ))
}

async fn effective_permissions(
    db: &Arc<DatabaseConnection>,
    user: &users::Model,
) -> ApiResult<EffectivePermissions> {
    let role = match user.role_id {
        Some(role_id) => {
            RoleRepository::new(db.clone())
                .find(user.tenant_id, role_id)
                .await?
        }
        None => None,
    };
    let set = RolePermissionRepository::new(db.clone())
        .permission_set(role.as_ref())
        .await?;
    Ok(EffectivePermissions::from(&set))
}

/// POST /auth/login - Authenticate a user of a tenant and open a session.
///
/// Unknown tenant, unknown email, inactive user and wrong password are
/// indistinguishable to the caller.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let db = state.db.clone();
    let slug = payload.tenant.trim().to_lowercase();
    let email = normalize_email(&payload.email);

    let Some(tenant) = TenantRepository::new(db.clone()).find_by_slug(&slug).await? else {
        verify_dummy(&payload.password);
        info!(tenant = %slug, "Login attempt for unknown tenant");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let user_repo = UserRepository::new(db.clone());
    let Some(user) = user_repo.find_by_email(tenant.id, &email).await? else {
        verify_dummy(&payload.password);
        info!(tenant_id = %tenant.id, "Login attempt for unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }
    if !user.is_active {
        info!(user_id = %user.id, "Login attempt for inactive user");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }
    if !tenant.is_active {
        info!(user_id = %user.id, tenant_id = %tenant.id, "Login attempt for inactive tenant");
        return Err(ApiError::forbidden("Tenant is inactive"));
    }

    let permissions = effective_permissions(&db, &user).await?;

    let session_id = Uuid::new_v4();
    let (tokens, refresh_expires_at) = issue_tokens(&state, &user, session_id)?;
    let client = ClientInfo::from_headers(&headers);

    SessionRepository::new(db.clone())
        .create(NewSession {
            id: session_id,
            user_id: user.id,
            tenant_id: user.tenant_id,
            refresh_token: &tokens.refresh_token,
            expires_at: refresh_expires_at,
            user_agent: client.user_agent.as_deref(),
            ip_address: client.ip_address.as_deref(),
        })
        .await?;
    user_repo.record_login(user.id).await?;

    info!(user_id = %user.id, tenant_id = %user.tenant_id, session_id = %session_id, "User logged in");

    Ok(ApiResponse::ok(LoginResponse {
        user: user.into(),
        permissions,
        tokens,
    }))
}

/// POST /auth/refresh - Rotate a session and issue a new token pair.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let claims = state
        .jwt_service
        .validate_token_kind(&payload.refresh_token, TokenKind::Refresh)?;

    let db = state.db.clone();
    let sessions = SessionRepository::new(db.clone());

    let session = sessions
        .find_by_token(&payload.refresh_token)
        .await?
        .filter(|s| s.id == claims.session_id() && s.user_id == claims.user_id())
        .ok_or_else(|| ApiError::unauthorized("Session expired or revoked"))?;

    let user = UserRepository::new(db.clone())
        .find(claims.tenant_id(), claims.user_id())
        .await?
        .filter(|u| u.is_active);
    let Some(user) = user else {
        sessions.revoke(session.id).await?;
        warn!(session_id = %session.id, "Refresh for missing or inactive user");
        return Err(ApiError::unauthorized("User not found or inactive"));
    };

    let tenant_active = TenantRepository::new(db.clone())
        .find_by_id(user.tenant_id)
        .await?
        .is_some_and(|t| t.is_active);
    if !tenant_active {
        return Err(ApiError::forbidden("Tenant is inactive"));
    }

    let session_id = Uuid::new_v4();
    let (tokens, refresh_expires_at) = issue_tokens(&state, &user, session_id)?;
    let client = ClientInfo::from_headers(&headers);

    let rotated = sessions
        .rotate(
            session.id,
            NewSession {
                id: session_id,
                user_id: user.id,
                tenant_id: user.tenant_id,
                refresh_token: &tokens.refresh_token,
                expires_at: refresh_expires_at,
                user_agent: client.user_agent.as_deref(),
                ip_address: client.ip_address.as_deref(),
            },
        )
        .await?;
    if rotated.is_none() {
        warn!(session_id = %session.id, "Refresh token reused during rotation");
        return Err(ApiError::unauthorized("Session expired or revoked"));
    }

    info!(user_id = %user.id, old_session = %session.id, new_session = %session_id, "Session rotated");

    Ok(ApiResponse::ok(tokens))
}

/// POST /auth/logout - Revoke the session of a refresh token.
///
/// Always answers 204 so that callers learn nothing about the token.
async fn logout(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LogoutRequest>,
) -> ApiResult<StatusCode> {
    let revoked = SessionRepository::new(state.db.clone())
        .revoke_by_token(&payload.refresh_token)
        .await?;
    if revoked {
        info!("Session revoked by logout");
    }
    Ok(no_content())
}

/// GET /auth/me - The current user with tenant, role and permissions.
async fn me(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> ApiResult<ApiResponse<MeResponse>> {
    let db = state.db.clone();

    let user = UserRepository::new(db.clone())
        .get(auth.tenant_id, auth.user_id)
        .await?;
    let tenant = TenantRepository::new(db.clone())
        .get(auth.tenant_id)
        .await?;
    let role = match auth.role_id {
        Some(role_id) => RoleRepository::new(db).find(auth.tenant_id, role_id).await?,
        None => None,
    };

    Ok(ApiResponse::ok(MeResponse {
        user: user.into(),
        tenant: tenant.into(),
        role: role.map(Into::into),
        permissions: EffectivePermissions::from(&auth.permissions),
    }))
}
