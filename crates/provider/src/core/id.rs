//! Identity namespacing
//!
//! Credential ids from different namespaces must never collide once
//! aggregated, so every externally-visible id carries a
//! `"<namespace><separator>"` prefix exactly once. The separator is `'_'`,
//! a character the namespace grammar can never contain, which makes the
//! prefix unambiguous to strip on the namespace side.

use crate::core::namespace::Namespace;

/// Separator between the namespace name and the local credential id
///
/// Reserved: `'_'` is not a valid namespace-name character, so a global id
/// always parses back to `(namespace, local id)` unambiguously.
pub const SEPARATOR: char = '_';

/// Builds the globally-unique id for a local credential id
pub fn global_id(namespace: &Namespace, local_id: &str) -> String {
    format!("{}{}{}", namespace.as_str(), SEPARATOR, local_id)
}

/// Whether an id already carries this namespace's prefix
///
/// A plain prefix check: a local id that coincidentally starts with
/// `"<namespace>_"` is accepted as already namespaced. That ambiguity is
/// inherent to the scheme and kept as-is; see the tests.
pub fn is_namespaced(namespace: &Namespace, id: &str) -> bool {
    id.strip_prefix(namespace.as_str())
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    #[test]
    fn global_id_joins_with_separator() {
        assert_eq!(global_id(&ns("test1"), "s1"), "test1_s1");
    }

    #[test]
    fn prefixed_id_is_detected() {
        let namespace = ns("test1");
        assert!(is_namespaced(&namespace, "test1_s1"));
        assert!(!is_namespaced(&namespace, "s1"));
        assert!(!is_namespaced(&namespace, "test2_s1"));
    }

    #[test]
    fn partial_namespace_match_is_not_enough() {
        // "test10_x" starts with "test1" but not with "test1_".
        assert!(!is_namespaced(&ns("test1"), "test10_x"));
    }

    #[test]
    fn local_id_shadowing_prefix_is_left_alone() {
        // Known edge case: a local id that happens to start with
        // "<namespace>_" is indistinguishable from an already-namespaced id,
        // so it is treated as pre-namespaced and never double-prefixed.
        assert!(is_namespaced(&ns("test1"), "test1_looks_prefixed"));
    }
}
