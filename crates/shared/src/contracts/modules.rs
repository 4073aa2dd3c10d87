//! Module contracts. A module is a functional area that groups permissions.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use super::validation::{validate_not_blank, validate_snake_case};

/// Create module request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateModuleRequest {
    /// Unique snake_case code, also the prefix of its permission codes.
    #[validate(length(min = 2, max = 63), custom(function = "validate_snake_case"))]
    pub code: String,
    /// Display name.
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    /// Description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Display order (default: 0).
    #[serde(default)]
    pub sort_order: i32,
    /// Whether the module is active (default: true).
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Update module request. The code is immutable.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateModuleRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    /// Description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500))]
    pub description: Option<Option<String>>,
    /// Display order.
    pub sort_order: Option<i32>,
    /// Active flag.
    pub is_active: Option<bool>,
}

impl UpdateModuleRequest {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.sort_order.is_none()
            && self.is_active.is_none()
    }
}

/// Query parameters for listing modules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleQuery {
    /// Filter by active status.
    pub active: Option<bool>,
}

/// Module as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleResponse {
    /// Module ID.
    pub id: Uuid,
    /// Code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Display order.
    pub sort_order: i32,
    /// Active flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_module_defaults() {
        let req: CreateModuleRequest =
            serde_json::from_str(r#"{"code":"users","name":"Users"}"#).unwrap();
        assert!(req.is_active);
        assert_eq!(req.sort_order, 0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_module_rejects_bad_code() {
        let req: CreateModuleRequest =
            serde_json::from_str(r#"{"code":"User-Admin","name":"Users"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }

    #[test]
    fn test_update_module_clear_description() {
        let req: UpdateModuleRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert!(!req.is_empty());
    }

    #[test]
    fn test_update_module_description_bounded() {
        let req = UpdateModuleRequest {
            description: Some(Some("x".repeat(501))),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));

        let cleared = UpdateModuleRequest {
            description: Some(None),
            ..Default::default()
        };
        assert!(cleared.validate().is_ok());
    }
}
