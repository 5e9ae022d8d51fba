//! Error types for the credential provider
//!
//! Three error families, matching how failures are recovered:
//! - [`ConfigError`]: rejected synchronously at configuration time; the
//!   previous configuration stays active.
//! - [`ConversionError`]: recovered locally — the offending secret is
//!   skipped with a warning and event processing continues.
//! - [`ProviderError`]: surfaced to callers of the provider API.

use thiserror::Error;

use crate::core::namespace::NAMESPACE_NAME_MAX_LENGTH;

/// Namespace configuration errors
///
/// One variant per validation failure so callers can render a specific
/// message for each reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Namespace name is empty or whitespace-only
    #[error("namespace name must not be blank")]
    EmptyName,

    /// Namespace name exceeds the Kubernetes 63-character limit
    #[error("namespace name exceeds {NAMESPACE_NAME_MAX_LENGTH} characters (got {len})")]
    TooLong {
        /// Length of the rejected name, in characters
        len: usize,
    },

    /// Namespace name starts with a dash
    #[error("namespace name '{name}' must not start with a dash")]
    LeadingDash {
        /// The rejected name
        name: String,
    },

    /// Namespace name ends with a dash
    #[error("namespace name '{name}' must not end with a dash")]
    TrailingDash {
        /// The rejected name
        name: String,
    },

    /// Namespace name contains a character outside `[a-z0-9-]`
    #[error("namespace name '{name}' contains invalid character '{character}'")]
    InvalidCharacter {
        /// The rejected name
        name: String,
        /// First offending character
        character: char,
    },
}

/// Secret-to-credential conversion errors
///
/// These never abort event processing; the secret is skipped and the
/// failure is logged.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Secret carries no kind label, so no converter can be selected
    #[error("secret '{secret}' has no '{label}' label")]
    MissingKindLabel {
        /// Secret name
        secret: String,
        /// The label that was expected
        label: &'static str,
    },

    /// No converter is registered for the secret's kind label value
    #[error("secret '{secret}' has unrecognized credential kind '{kind}'")]
    UnknownKind {
        /// Secret name
        secret: String,
        /// The unrecognized kind label value
        kind: String,
    },

    /// Secret data is missing a key the converter requires
    #[error("secret '{secret}' is missing data key '{key}'")]
    MissingDataKey {
        /// Secret name
        secret: String,
        /// The missing data key
        key: String,
    },

    /// Secret data is present but malformed
    #[error("secret '{secret}' has invalid data: {reason}")]
    InvalidData {
        /// Secret name
        secret: String,
        /// What went wrong
        reason: String,
    },
}

/// A credential refused to have its id rewritten
///
/// Treated as fatal for that credential only: it is logged with full
/// context and left out of query results rather than returned with a
/// wrong or missing id.
#[derive(Debug, Error)]
#[error("credential '{id}' does not support id rewriting: {reason}")]
pub struct IdRewriteError {
    /// Id the credential currently carries
    pub id: String,
    /// Why the rewrite was refused
    pub reason: String,
}

/// Errors surfaced by the provider API
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An operation referenced a namespace that is not in the active set
    #[error("no such namespace '{namespace}' in the active configuration")]
    UnknownNamespace {
        /// The unconfigured namespace name
        namespace: String,
    },

    /// Configuration was rejected
    #[error("configuration rejected: {source}")]
    Config {
        /// Underlying validation failure
        #[from]
        source: ConfigError,
    },
}

/// Crate-wide result alias
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
