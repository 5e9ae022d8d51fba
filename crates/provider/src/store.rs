//! Per-context credential stores
//!
//! A [`CredentialStore`] is a read view over the aggregated collection
//! bound to one opaque context handle (a folder, an organization, ...).
//! Stores are created lazily, at most one per distinct context, and live
//! for the rest of the process.

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::core::{Credential, CredentialScope};
use crate::provider::NamespacedCredentialProvider;

/// Opaque context a store is bound to
///
/// Context handles are compared by identity, not value: two distinct
/// handles that happen to be semantically equal get two distinct stores.
pub trait StoreContext: fmt::Debug + Send + Sync {
    /// Display label, used for logging only
    fn name(&self) -> &str;
}

/// Shared handle to a store context
pub type ContextHandle = Arc<dyn StoreContext>;

/// Read view over the aggregated credentials for one context
pub struct CredentialStore {
    provider: Weak<NamespacedCredentialProvider>,
    context: ContextHandle,
}

impl CredentialStore {
    pub(crate) fn new(
        provider: &Arc<NamespacedCredentialProvider>,
        context: ContextHandle,
    ) -> Self {
        Self {
            provider: Arc::downgrade(provider),
            context,
        }
    }

    /// The context this store is bound to
    pub fn context(&self) -> &ContextHandle {
        &self.context
    }

    /// All globally-scoped credentials currently visible
    ///
    /// System-scoped credentials are reserved for the host and never
    /// exposed through a per-context store.
    pub fn credentials(&self) -> Vec<Arc<dyn Credential>> {
        self.credentials_of_kind(None)
    }

    /// Globally-scoped credentials of one kind
    pub fn credentials_of_kind(&self, kind: Option<&str>) -> Vec<Arc<dyn Credential>> {
        match self.provider.upgrade() {
            Some(provider) => provider
                .get_credentials(kind)
                .into_iter()
                .filter(|credential| credential.scope() == CredentialScope::Global)
                .collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("context", &self.context.name())
            .finish()
    }
}

/// Process-wide lazy cache: at most one store per distinct context
///
/// Keyed by the handle's pointer identity. Insert-if-absent: on a racing
/// first request the loser's store is discarded and the winner's is
/// returned to both. Entries are never evicted.
#[derive(Default)]
pub(crate) struct ScopedStoreCache {
    stores: DashMap<usize, Arc<CredentialStore>>,
}

impl ScopedStoreCache {
    fn key(context: &ContextHandle) -> usize {
        Arc::as_ptr(context).cast::<()>() as usize
    }

    pub(crate) fn get_or_create(
        &self,
        provider: &Arc<NamespacedCredentialProvider>,
        context: &ContextHandle,
    ) -> Arc<CredentialStore> {
        self.stores
            .entry(Self::key(context))
            .or_insert_with(|| Arc::new(CredentialStore::new(provider, Arc::clone(context))))
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.stores.len()
    }
}
