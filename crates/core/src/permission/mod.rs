//! Permission-based access control.
//!
//! This module provides:
//! - The permission code grammar (`<module>.<action>`, with `<module>.*`)
//! - Permission sets resolved from a role
//! - The authorization decision used by the HTTP guard
//! - The catalog of every code the API checks

pub mod catalog;
mod code;
mod set;

#[cfg(test)]
mod props;

pub use code::{MAX_SEGMENT_LEN, PermissionCode, WILDCARD_ACTION};
pub use set::{Decision, PermissionSet, Requirement, authorize};

use bastion_shared::AppError;
use thiserror::Error;

/// Errors produced by permission handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// A code does not follow the grammar.
    #[error("invalid permission code '{code}': {reason}")]
    InvalidCode {
        /// The offending input.
        code: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The caller lacks required permissions.
    #[error("missing permission(s): {}", missing.join(", "))]
    Denied {
        /// Codes that would have satisfied the requirement.
        missing: Vec<String>,
    },
}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::InvalidCode { .. } => Self::Validation(err.to_string()),
            PermissionError::Denied { ref missing } => {
                Self::Forbidden(format!("Missing permission(s): {}", missing.join(", ")))
            }
        }
    }
}

/// Converts a decision into a `Result`.
///
/// # Errors
///
/// Returns `PermissionError::Denied` for [`Decision::Deny`].
pub fn ensure(set: &PermissionSet, requirement: Requirement<'_>) -> Result<(), PermissionError> {
    match authorize(set, requirement) {
        Decision::Allow => Ok(()),
        Decision::Deny { missing } => Err(PermissionError::Denied { missing }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_maps_denial_to_forbidden() {
        let err = ensure(&PermissionSet::empty(), Requirement::All(&["users.read"])).unwrap_err();
        assert_eq!(
            err,
            PermissionError::Denied {
                missing: vec!["users.read".into()]
            }
        );

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 403);
        assert_eq!(app.public_message(), "Missing permission(s): users.read");
    }

    #[test]
    fn test_invalid_code_maps_to_validation() {
        let err = PermissionCode::parse("nope").unwrap_err();
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
    }
}
