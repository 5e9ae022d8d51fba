//! Namespace names and the configured namespace set
//!
//! Provides a validated [`Namespace`] newtype (RFC 1123 label grammar, the
//! same rules the Kubernetes API applies to namespace names) and
//! [`NamespaceSet`], the ordered, deduplicated collection the provider is
//! configured with.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::ConfigError;

/// Maximum length for a namespace name (Kubernetes limit)
pub const NAMESPACE_NAME_MAX_LENGTH: usize = 63;

/// A validated Kubernetes namespace name
///
/// Grammar: lowercase alphanumeric, may contain interior dashes, 1-63
/// characters, no leading or trailing dash. Two namespaces are equal iff
/// their names are equal.
///
/// # Examples
///
/// ```
/// use kube_namespaced_credentials::Namespace;
///
/// let ns = Namespace::new("team-alpha").unwrap();
/// assert_eq!(ns.as_str(), "team-alpha");
///
/// assert!(Namespace::new("Team-Alpha").is_err()); // uppercase
/// assert!(Namespace::new("-alpha").is_err()); // leading dash
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Creates a validated namespace name
    ///
    /// # Errors
    ///
    /// Returns the specific [`ConfigError`] variant describing why
    /// validation failed: blank, too long, leading/trailing dash, or an
    /// invalid character.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Validates a candidate namespace name without constructing one
    ///
    /// Checks are ordered so the most descriptive reason wins: blankness,
    /// then length, then dash placement, then the character set.
    pub fn validate(name: &str) -> Result<(), ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }

        // Counted in characters, not bytes: a short multibyte name should
        // fall through to the character-set check, not report an inflated
        // byte length.
        let length = name.chars().count();
        if length > NAMESPACE_NAME_MAX_LENGTH {
            return Err(ConfigError::TooLong { len: length });
        }

        if name.starts_with('-') {
            return Err(ConfigError::LeadingDash {
                name: name.to_string(),
            });
        }

        if name.ends_with('-') {
            return Err(ConfigError::TrailingDash {
                name: name.to_string(),
            });
        }

        if let Some(character) = name.chars().find(|c| !Self::is_valid_char(*c)) {
            return Err(ConfigError::InvalidCharacter {
                name: name.to_string(),
                character,
            });
        }

        Ok(())
    }

    fn is_valid_char(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
    }

    /// Returns the namespace name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts to an owned string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        namespace.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Namespace::new(s)
    }
}

/// Ordered, deduplicated set of namespaces
///
/// Adding a name that is already present is a logged no-op, not an error.
/// Replacement is all-or-nothing: if any name in a batch fails validation
/// the whole batch is rejected and the existing set stays untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSet {
    names: Vec<Namespace>,
}

impl NamespaceSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw names, validating the whole batch first
    ///
    /// Duplicates within the batch are dropped with a warning, matching
    /// [`NamespaceSet::add`].
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; no partial set is produced.
    pub fn from_names<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validated = Vec::new();
        for name in names {
            validated.push(Namespace::new(name.as_ref())?);
        }

        let mut set = Self::new();
        for namespace in validated {
            set.add(namespace);
        }
        Ok(set)
    }

    /// Adds a namespace; returns `false` if it was already present
    pub fn add(&mut self, namespace: Namespace) -> bool {
        if self.names.contains(&namespace) {
            warn!(namespace = %namespace, "duplicate namespace detected, ignoring");
            return false;
        }
        self.names.push(namespace);
        true
    }

    /// Replaces the whole set atomically from the caller's point of view
    ///
    /// # Errors
    ///
    /// If any name fails validation the replacement is rejected and `self`
    /// is left unchanged.
    pub fn replace_all<I, S>(&mut self, names: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        *self = Self::from_names(names)?;
        Ok(())
    }

    /// Whether a namespace with this name is in the set
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|ns| ns.as_str() == name)
    }

    /// Iterates namespaces in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.names.iter()
    }

    /// Number of namespaces in the set
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> IntoIterator for &'a NamespaceSet {
    type Item = &'a Namespace;
    type IntoIter = std::slice::Iter<'a, Namespace>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("default")]
    #[case("kube-system")]
    #[case("team-alpha-7")]
    #[case("a")]
    #[case("0numbers9")]
    fn valid_names_are_accepted(#[case] name: &str) {
        assert_eq!(Namespace::validate(name), Ok(()));
    }

    #[rstest]
    #[case("", ConfigError::EmptyName)]
    #[case("   ", ConfigError::EmptyName)]
    #[case("-leading", ConfigError::LeadingDash { name: "-leading".into() })]
    #[case("trailing-", ConfigError::TrailingDash { name: "trailing-".into() })]
    #[case("UpperCase", ConfigError::InvalidCharacter { name: "UpperCase".into(), character: 'U' })]
    #[case("under_score", ConfigError::InvalidCharacter { name: "under_score".into(), character: '_' })]
    #[case("dot.dot", ConfigError::InvalidCharacter { name: "dot.dot".into(), character: '.' })]
    fn invalid_names_report_specific_reason(#[case] name: &str, #[case] expected: ConfigError) {
        assert_eq!(Namespace::validate(name), Err(expected));
    }

    #[test]
    fn names_over_63_chars_are_too_long() {
        let name = "a".repeat(64);
        assert_eq!(
            Namespace::validate(&name),
            Err(ConfigError::TooLong { len: 64 })
        );

        // Exactly 63 is still fine.
        assert_eq!(Namespace::validate(&"a".repeat(63)), Ok(()));
    }

    #[test]
    fn length_is_counted_in_characters_not_bytes() {
        // 40 two-byte characters: 80 bytes but only 40 characters, so the
        // charset check is the one that rejects it.
        let name = "é".repeat(40);
        assert_eq!(
            Namespace::validate(&name),
            Err(ConfigError::InvalidCharacter {
                name: name.clone(),
                character: 'é',
            })
        );

        // 64 of them is rejected for length, reported as 64, not 128.
        assert_eq!(
            Namespace::validate(&"é".repeat(64)),
            Err(ConfigError::TooLong { len: 64 })
        );
    }

    #[test]
    fn namespaces_are_equal_by_name() {
        let a = Namespace::new("same").unwrap();
        let b = Namespace::new("same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn adding_duplicate_is_a_no_op() {
        let mut set = NamespaceSet::new();
        assert!(set.add(Namespace::new("test1").unwrap()));
        assert!(!set.add(Namespace::new("test1").unwrap()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_names_dedups_within_a_batch() {
        let set = NamespaceSet::from_names(["test1", "test2", "test1"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("test1"));
        assert!(set.contains("test2"));
    }

    #[test]
    fn replace_all_is_all_or_nothing() {
        let mut set = NamespaceSet::from_names(["old"]).unwrap();

        let result = set.replace_all(["new1", "Bad Name", "new2"]);
        assert!(result.is_err());

        // Previous configuration stays active.
        assert_eq!(set.len(), 1);
        assert!(set.contains("old"));

        set.replace_all(["new1", "new2"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.contains("old"));
    }

    #[test]
    fn namespace_serde_round_trip() {
        let ns = Namespace::new("team-alpha").unwrap();
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, "\"team-alpha\"");

        let back: Namespace = serde_json::from_str(&json).unwrap();
        assert_eq!(ns, back);

        let invalid: Result<Namespace, _> = serde_json::from_str("\"-bad\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn namespace_set_preserves_insertion_order() {
        let set = NamespaceSet::from_names(["b", "a", "c"]).unwrap();
        let names: Vec<_> = set.iter().map(Namespace::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
