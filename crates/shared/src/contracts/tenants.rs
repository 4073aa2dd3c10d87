//! Tenant contracts.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::{validate_not_blank, validate_slug};

/// Create tenant request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub name: String,
    /// URL-friendly identifier used at login.
    #[validate(length(min = 2, max = 63), custom(function = "validate_slug"))]
    pub slug: String,
}

/// Update tenant request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTenantRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    /// Enable or disable the tenant.
    pub is_active: Option<bool>,
}

impl UpdateTenantRequest {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_active.is_none()
    }
}

/// Tenant as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantResponse {
    /// Tenant ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Slug.
    pub slug: String,
    /// Whether users of this tenant may sign in.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}
