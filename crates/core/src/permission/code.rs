//! Permission code grammar.
//!
//! A code is `<module>.<action>`. Both segments are snake_case identifiers of
//! at most 63 bytes; the action may instead be `*`, which stands for every
//! action of the module.

use std::fmt;

use super::PermissionError;

/// Maximum length of a single segment.
pub const MAX_SEGMENT_LEN: usize = 63;

/// Action segment that matches every action of a module.
pub const WILDCARD_ACTION: &str = "*";

/// A parsed, well-formed permission code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PermissionCode {
    raw: String,
    dot: usize,
}

impl PermissionCode {
    /// Parses and validates a permission code.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::InvalidCode` when the input does not follow
    /// the `<module>.<action>` grammar.
    pub fn parse(input: &str) -> Result<Self, PermissionError> {
        let invalid = |reason: &str| PermissionError::InvalidCode {
            code: input.to_string(),
            reason: reason.to_string(),
        };

        let Some((module, action)) = input.split_once('.') else {
            return Err(invalid("expected <module>.<action>"));
        };
        if action.contains('.') {
            return Err(invalid("only one '.' separator is allowed"));
        }
        if !is_segment(module) {
            return Err(invalid("module segment must be snake_case"));
        }
        if action != WILDCARD_ACTION && !is_segment(action) {
            return Err(invalid("action segment must be snake_case or '*'"));
        }

        Ok(Self {
            raw: input.to_string(),
            dot: module.len(),
        })
    }

    /// Builds the code granting every action of `module`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::InvalidCode` if `module` is not a valid segment.
    pub fn wildcard(module: &str) -> Result<Self, PermissionError> {
        Self::parse(&format!("{module}.{WILDCARD_ACTION}"))
    }

    /// The module segment.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.raw[..self.dot]
    }

    /// The action segment.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.raw[self.dot + 1..]
    }

    /// True for `<module>.*`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.action() == WILDCARD_ACTION
    }

    /// True when holding `self` satisfies a requirement for `other`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        if self.is_wildcard() {
            self.module() == other.module()
        } else {
            self == other
        }
    }

    /// The code as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for PermissionCode {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    segment.len() <= MAX_SEGMENT_LEN
        && first.is_ascii_lowercase()
        && !segment.ends_with('_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users.read", "users", "read")]
    #[case("role_permissions.update", "role_permissions", "update")]
    #[case("reports.*", "reports", "*")]
    #[case("v2.export_csv", "v2", "export_csv")]
    fn test_parse_valid(#[case] input: &str, #[case] module: &str, #[case] action: &str) {
        let code = PermissionCode::parse(input).unwrap();
        assert_eq!(code.module(), module);
        assert_eq!(code.action(), action);
        assert_eq!(code.as_str(), input);
        assert_eq!(code.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("users")]
    #[case("*")]
    #[case("*.read")]
    #[case("users.")]
    #[case(".read")]
    #[case("users.read.all")]
    #[case("Users.read")]
    #[case("users.Read")]
    #[case("users.re-ad")]
    #[case("users_.read")]
    #[case("users.read ")]
    #[case("1users.read")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(
            matches!(
                PermissionCode::parse(input),
                Err(PermissionError::InvalidCode { .. })
            ),
            "{input:?} should be rejected"
        );
    }

    #[test]
    fn test_segment_length_limit() {
        let long = "a".repeat(MAX_SEGMENT_LEN + 1);
        assert!(PermissionCode::parse(&format!("{long}.read")).is_err());
        let max = "a".repeat(MAX_SEGMENT_LEN);
        assert!(PermissionCode::parse(&format!("{max}.read")).is_ok());
    }

    #[test]
    fn test_wildcard_covers_module_only() {
        let wildcard = PermissionCode::wildcard("users").unwrap();
        let read = PermissionCode::parse("users.read").unwrap();
        let other = PermissionCode::parse("roles.read").unwrap();

        assert!(wildcard.is_wildcard());
        assert!(wildcard.covers(&read));
        assert!(!wildcard.covers(&other));
        assert!(read.covers(&read));
        assert!(!read.covers(&wildcard));
    }
}
