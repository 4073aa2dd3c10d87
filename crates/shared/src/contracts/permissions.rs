//! Permission contracts.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use super::validation::validate_not_blank;

/// Create permission request.
///
/// The code grammar (`<module>.<action>`) and its agreement with the owning
/// module are checked by the handler, which knows the module.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    /// Owning module.
    pub module_id: Uuid,
    /// Permission code such as `users.read`.
    #[validate(length(min = 3, max = 127))]
    pub code: String,
    /// Display name.
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    /// Description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Update permission request. Code and module are immutable.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    /// Description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500))]
    pub description: Option<Option<String>>,
}

impl UpdatePermissionRequest {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Query parameters for listing permissions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionQuery {
    /// Only permissions of this module.
    pub module_id: Option<Uuid>,
}

/// Permission as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionResponse {
    /// Permission ID.
    pub id: Uuid,
    /// Owning module.
    pub module_id: Uuid,
    /// Code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_permission_validation() {
        let req = CreatePermissionRequest {
            module_id: Uuid::new_v4(),
            code: "u".into(),
            name: String::new(),
            description: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("code"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_update_permission_description_bounded() {
        let req: UpdatePermissionRequest =
            serde_json::from_value(serde_json::json!({ "description": "d".repeat(501) })).unwrap();
        assert!(req.validate().is_err());

        let ok: UpdatePermissionRequest =
            serde_json::from_value(serde_json::json!({ "description": "d".repeat(500) })).unwrap();
        assert!(ok.validate().is_ok());
    }
}
