//! User contracts.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use super::validation::{validate_not_blank, validate_password_strength};

/// Create user request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Email, unique within the tenant.
    #[validate(email, length(max = 255))]
    pub email: String,
    /// Initial password.
    #[validate(length(min = 8, max = 128), custom(function = "validate_password_strength"))]
    pub password: String,
    /// Full name.
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub full_name: String,
    /// Role in the caller's tenant.
    pub role_id: Option<Uuid>,
    /// Whether the account may sign in (default: true).
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Update user request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Email.
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    /// Full name.
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub full_name: Option<String>,
    /// New password.
    #[validate(length(min = 8, max = 128), custom(function = "validate_password_strength"))]
    pub password: Option<String>,
    /// Role; `null` removes the role.
    #[serde(default, deserialize_with = "double_option")]
    pub role_id: Option<Option<Uuid>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.password.is_none()
            && self.role_id.is_none()
            && self.is_active.is_none()
    }
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    /// Only users holding this role.
    pub role_id: Option<Uuid>,
    /// Filter by active status.
    pub active: Option<bool>,
}

/// User as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Assigned role.
    pub role_id: Option<Uuid>,
    /// Email.
    pub email: String,
    /// Full name.
    pub full_name: String,
    /// Active flag.
    pub is_active: bool,
    /// Last successful login.
    pub last_login_at: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;

    fn valid_request() -> CreateUserRequest {
        CreateUserRequest {
            email: SafeEmail().fake(),
            password: "correct-horse-9".into(),
            full_name: Name().fake(),
            role_id: None,
            is_active: true,
        }
    }

    #[test]
    fn test_create_user_valid() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_create_user_rejects_bad_email_and_weak_password() {
        let req = CreateUserRequest {
            email: "not-an-email".into(),
            password: "password".into(),
            ..valid_request()
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_create_user_rejects_short_password() {
        let req = CreateUserRequest {
            password: "a1".into(),
            ..valid_request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_user_role_null_clears() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"role_id":null}"#).unwrap();
        assert_eq!(req.role_id, Some(None));
        assert!(!req.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_user_validates_present_fields_only() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"password":"short"}"#).unwrap();
        assert!(req.validate().is_err());
        assert!(UpdateUserRequest::default().validate().is_ok());
    }
}
