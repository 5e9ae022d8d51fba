//! The credential capability trait
//!
//! Converters produce boxed [`Credential`] values; the per-namespace index
//! owns them (behind `Arc`) until the backing secret is deleted. The trait
//! deliberately exposes an explicit [`Credential::set_id`] capability: the
//! engine rewrites ids to their namespace-global form after conversion, and
//! a credential that cannot be rewritten is dropped from results rather
//! than returned with a wrong id.

use std::fmt;

use crate::core::error::IdRewriteError;

/// Visibility scope of a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialScope {
    /// Usable by any consumer of the aggregated collection
    Global,
    /// Reserved for the host system itself; hidden from per-context stores
    System,
}

/// A typed credential converted from a Kubernetes Secret
///
/// Object-safe so heterogeneous credential kinds can live in one cache.
pub trait Credential: fmt::Debug + Send + Sync {
    /// Current id; after indexing this always carries the owning
    /// namespace's prefix exactly once
    fn id(&self) -> &str;

    /// Replaces the id
    ///
    /// # Errors
    ///
    /// Implementations may refuse the rewrite (for example a credential
    /// whose id is derived state); the engine logs the refusal and leaves
    /// the credential out of query results.
    fn set_id(&mut self, id: String) -> Result<(), IdRewriteError>;

    /// Scope of this credential
    fn scope(&self) -> CredentialScope;

    /// Kind selector, matching the converter that produced it and the
    /// `kind` filter of queries
    fn kind(&self) -> &str;
}
