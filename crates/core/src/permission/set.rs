//! Permission sets and the authorization decision.

use std::collections::BTreeSet;

use bastion_shared::contracts::auth::EffectivePermissions;

use super::code::PermissionCode;

/// The permissions held by a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    superuser: bool,
    exact: BTreeSet<String>,
    module_wildcards: BTreeSet<String>,
}

impl PermissionSet {
    /// A set that allows nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A set that allows everything.
    #[must_use]
    pub fn superuser() -> Self {
        Self {
            superuser: true,
            ..Self::default()
        }
    }

    /// Builds a set from stored permission codes.
    ///
    /// Malformed codes grant nothing and are returned separately so the
    /// caller can report them.
    pub fn from_codes<I, S>(codes: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        let mut rejected = Vec::new();
        for code in codes {
            match PermissionCode::parse(code.as_ref()) {
                Ok(parsed) => set.insert(&parsed),
                Err(_) => rejected.push(code.as_ref().to_string()),
            }
        }
        (set, rejected)
    }

    /// Adds a code to the set.
    pub fn insert(&mut self, code: &PermissionCode) {
        if code.is_wildcard() {
            self.module_wildcards.insert(code.module().to_string());
        } else {
            self.exact.insert(code.as_str().to_string());
        }
    }

    /// True for a superuser set.
    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.superuser
    }

    /// True when no code is held and the set is not a superuser set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.superuser && self.exact.is_empty() && self.module_wildcards.is_empty()
    }

    /// True when holding this set satisfies a requirement for `code`.
    ///
    /// A malformed `code` is only allowed for a superuser set.
    #[must_use]
    pub fn allows(&self, code: &str) -> bool {
        if self.superuser {
            return true;
        }
        match PermissionCode::parse(code) {
            Ok(parsed) => self.allows_code(&parsed),
            Err(_) => false,
        }
    }

    /// Same as [`Self::allows`] for an already parsed code.
    #[must_use]
    pub fn allows_code(&self, code: &PermissionCode) -> bool {
        if self.superuser {
            return true;
        }
        if code.is_wildcard() {
            return self.module_wildcards.contains(code.module());
        }
        self.exact.contains(code.as_str()) || self.module_wildcards.contains(code.module())
    }

    /// Every held code, sorted, with module wildcards written as `<module>.*`.
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .exact
            .iter()
            .cloned()
            .chain(self.module_wildcards.iter().map(|m| format!("{m}.*")))
            .collect();
        codes.sort();
        codes
    }
}

impl From<&PermissionSet> for EffectivePermissions {
    fn from(set: &PermissionSet) -> Self {
        Self {
            superuser: set.is_superuser(),
            codes: set.codes(),
        }
    }
}

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement<'a> {
    /// Every listed code must be allowed.
    All(&'a [&'a str]),
    /// At least one listed code must be allowed.
    Any(&'a [&'a str]),
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The requirement is met.
    Allow,
    /// The requirement is not met.
    Deny {
        /// Codes that would have satisfied the requirement.
        missing: Vec<String>,
    },
}

impl Decision {
    /// True for [`Decision::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Checks `requirement` against `set`.
///
/// An empty requirement always allows.
#[must_use]
pub fn authorize(set: &PermissionSet, requirement: Requirement<'_>) -> Decision {
    match requirement {
        Requirement::All(codes) => {
            let missing: Vec<String> = codes
                .iter()
                .filter(|code| !set.allows(code))
                .map(ToString::to_string)
                .collect();
            if missing.is_empty() {
                Decision::Allow
            } else {
                Decision::Deny { missing }
            }
        }
        Requirement::Any(codes) => {
            if codes.is_empty() || codes.iter().any(|code| set.allows(code)) {
                Decision::Allow
            } else {
                Decision::Deny {
                    missing: codes.iter().map(ToString::to_string).collect(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(codes: &[&str]) -> PermissionSet {
        let (set, rejected) = PermissionSet::from_codes(codes);
        assert!(rejected.is_empty(), "unexpected rejects: {rejected:?}");
        set
    }

    #[rstest]
    #[case(&["users.read"], "users.read", true)]
    #[case(&["users.read"], "users.update", false)]
    #[case(&["users.*"], "users.delete", true)]
    #[case(&["users.*"], "roles.read", false)]
    #[case(&["users.*"], "users.*", true)]
    #[case(&["users.read"], "users.*", false)]
    #[case(&[], "users.read", false)]
    #[case(&["users.read"], "not a code", false)]
    fn test_allows(#[case] held: &[&str], #[case] wanted: &str, #[case] expected: bool) {
        assert_eq!(set(held).allows(wanted), expected);
    }

    #[test]
    fn test_superuser_allows_everything() {
        let su = PermissionSet::superuser();
        assert!(su.allows("users.read"));
        assert!(su.allows("anything.at_all"));
        assert!(!su.is_empty());
        assert!(su.codes().is_empty());
    }

    #[test]
    fn test_from_codes_reports_malformed() {
        let (set, rejected) = PermissionSet::from_codes(["users.read", "*", "Bad.code"]);
        assert_eq!(rejected, vec!["*".to_string(), "Bad.code".to_string()]);
        assert_eq!(set.codes(), vec!["users.read".to_string()]);
    }

    #[test]
    fn test_codes_sorted_with_wildcards() {
        let s = set(&["users.read", "roles.*", "modules.read"]);
        assert_eq!(s.codes(), vec!["modules.read", "roles.*", "users.read"]);
    }

    #[test]
    fn test_authorize_all_lists_missing() {
        let s = set(&["users.read"]);
        assert_eq!(
            authorize(&s, Requirement::All(&["users.read", "users.update", "roles.read"])),
            Decision::Deny {
                missing: vec!["users.update".into(), "roles.read".into()]
            }
        );
        assert!(authorize(&s, Requirement::All(&["users.read"])).is_allowed());
    }

    #[test]
    fn test_authorize_any() {
        let s = set(&["roles.read"]);
        assert!(authorize(&s, Requirement::Any(&["users.read", "roles.read"])).is_allowed());
        assert_eq!(
            authorize(&s, Requirement::Any(&["users.read", "users.update"])),
            Decision::Deny {
                missing: vec!["users.read".into(), "users.update".into()]
            }
        );
    }

    #[test]
    fn test_empty_requirement_allows() {
        let s = PermissionSet::empty();
        assert!(authorize(&s, Requirement::All(&[])).is_allowed());
        assert!(authorize(&s, Requirement::Any(&[])).is_allowed());
    }

    #[test]
    fn test_effective_permissions_view() {
        let s = set(&["users.read", "roles.*"]);
        let view = EffectivePermissions::from(&s);
        assert!(!view.superuser);
        assert_eq!(view.codes, vec!["roles.*", "users.read"]);
    }
}
