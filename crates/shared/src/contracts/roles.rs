//! Role and role-permission contracts.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use super::permissions::PermissionResponse;
use super::validation::validate_not_blank;

/// Upper bound on permission ids accepted in one request.
pub const MAX_PERMISSIONS_PER_REQUEST: u64 = 1000;

/// Create role request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    /// Name, unique within the tenant.
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    /// Description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Whether holders pass every permission check.
    #[serde(default)]
    pub is_superuser: bool,
    /// Permissions granted on creation.
    #[serde(default)]
    #[validate(length(max = MAX_PERMISSIONS_PER_REQUEST))]
    pub permission_ids: Vec<Uuid>,
}

/// Update role request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    /// Name.
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    /// Description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500))]
    pub description: Option<Option<String>>,
    /// Superuser flag.
    pub is_superuser: Option<bool>,
}

impl UpdateRoleRequest {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_superuser.is_none()
    }
}

/// Replace-all request for a role's permissions.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetRolePermissionsRequest {
    /// The complete new set; duplicates are ignored.
    #[validate(length(max = MAX_PERMISSIONS_PER_REQUEST))]
    pub permission_ids: Vec<Uuid>,
}

/// Role as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    /// Role ID.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Seeded role that cannot be removed.
    pub is_system: bool,
    /// Passes every permission check.
    pub is_superuser: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

/// The permissions currently granted to a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermissionsResponse {
    /// Role ID.
    pub role_id: Uuid,
    /// Granted permissions ordered by code.
    pub permissions: Vec<PermissionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_role_defaults() {
        let req: CreateRoleRequest = serde_json::from_str(r#"{"name":"Auditor"}"#).unwrap();
        assert!(!req.is_superuser);
        assert!(req.permission_ids.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_set_role_permissions_limit() {
        let req = SetRolePermissionsRequest {
            permission_ids: (0..=MAX_PERMISSIONS_PER_REQUEST).map(|_| Uuid::new_v4()).collect(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_role_is_empty() {
        assert!(UpdateRoleRequest::default().is_empty());
    }

    #[test]
    fn test_update_role_description_matches_create_limit() {
        let long = "r".repeat(501);
        let update = UpdateRoleRequest {
            description: Some(Some(long.clone())),
            ..Default::default()
        };
        let create = CreateRoleRequest {
            name: "Auditor".into(),
            description: Some(long),
            is_superuser: false,
            permission_ids: Vec::new(),
        };
        assert!(update.validate().is_err());
        assert!(create.validate().is_err());
    }
}
