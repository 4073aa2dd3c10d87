//! Property-based tests for permission codes and matching.

use proptest::prelude::*;

use super::{PermissionCode, PermissionSet, Requirement, authorize};

/// Strategy for a valid snake_case segment.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,10}(_[a-z0-9]{1,5}){0,2}"
}

fn code() -> impl Strategy<Value = String> {
    (segment(), segment()).prop_map(|(m, a)| format!("{m}.{a}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every generated code parses and splits back into its segments.
    #[test]
    fn prop_valid_codes_parse(module in segment(), action in segment()) {
        let raw = format!("{module}.{action}");
        let parsed = PermissionCode::parse(&raw).unwrap();
        prop_assert_eq!(parsed.module(), module.as_str());
        prop_assert_eq!(parsed.action(), action.as_str());
    }

    /// Uppercase input never parses.
    #[test]
    fn prop_uppercase_rejected(raw in code()) {
        let upper = raw.to_uppercase();
        prop_assert!(PermissionCode::parse(&upper).is_err());
    }

    /// A set allows exactly the codes it was built from, and nothing else
    /// outside their modules.
    #[test]
    fn prop_exact_grants(held in prop::collection::vec(code(), 0..8), wanted in code()) {
        let (set, rejected) = PermissionSet::from_codes(&held);
        prop_assert!(rejected.is_empty());
        prop_assert_eq!(set.allows(&wanted), held.contains(&wanted));
    }

    /// A module wildcard allows every action of that module.
    #[test]
    fn prop_wildcard_grants_module(module in segment(), action in segment()) {
        let (set, _) = PermissionSet::from_codes([format!("{module}.*")]);
        let wanted = format!("{module}.{action}");
        prop_assert!(set.allows(&wanted));
    }

    /// `All` allows iff every code is allowed individually.
    #[test]
    fn prop_all_is_conjunction(
        held in prop::collection::vec(code(), 0..6),
        wanted in prop::collection::vec(code(), 0..4),
    ) {
        let (set, _) = PermissionSet::from_codes(&held);
        let wanted_refs: Vec<&str> = wanted.iter().map(String::as_str).collect();
        let decision = authorize(&set, Requirement::All(&wanted_refs));
        prop_assert_eq!(decision.is_allowed(), wanted.iter().all(|c| set.allows(c)));
    }

    /// The superuser set allows anything, well-formed or not.
    #[test]
    fn prop_superuser_allows_any_string(raw in ".*") {
        prop_assert!(PermissionSet::superuser().allows(&raw));
    }
}
