//! Request and response contracts for every API resource.
//!
//! Request bodies derive [`validator::Validate`]; the HTTP layer rejects a
//! body before any handler logic runs if validation fails. Response types are
//! plain serializable views of stored rows and never carry secrets.

pub mod auth;
pub mod modules;
pub mod permissions;
pub mod roles;
pub mod tenants;
pub mod users;
pub mod validation;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "explicit null".
///
/// Use together with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)`, a value gives `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Normalizes an email address for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
