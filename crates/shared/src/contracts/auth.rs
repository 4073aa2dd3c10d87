//! Authentication contracts.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::roles::RoleResponse;
use super::tenants::TenantResponse;
use super::users::UserResponse;
use crate::auth::TokenPair;

/// Login request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Tenant slug.
    #[validate(length(min = 1, max = 63))]
    pub tenant: String,
    /// User email.
    #[validate(email)]
    pub email: String,
    /// User password.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    /// The refresh token.
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogoutRequest {
    /// The refresh token to invalidate.
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// The permissions a user effectively holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// Holder passes every check regardless of `codes`.
    pub superuser: bool,
    /// Granted permission codes, sorted.
    pub codes: Vec<String>,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user.
    pub user: UserResponse,
    /// Effective permissions.
    pub permissions: EffectivePermissions,
    /// Issued tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// The current user.
    pub user: UserResponse,
    /// The tenant the session belongs to.
    pub tenant: TenantResponse,
    /// Assigned role, if any.
    pub role: Option<RoleResponse>,
    /// Effective permissions.
    pub permissions: EffectivePermissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let req = LoginRequest {
            tenant: String::new(),
            email: "nope".into(),
            password: String::new(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("tenant"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
