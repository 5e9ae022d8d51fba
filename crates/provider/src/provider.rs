//! The aggregating provider
//!
//! [`NamespacedCredentialProvider`] is the only surface callers use. It
//! fans queries out across every active [`NamespaceIndex`], swaps the
//! active index set copy-on-write when the configuration changes, and
//! hands out per-context stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use kube::Client;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::convert::ConverterRegistry;
use crate::core::{ConfigError, Credential, NamespaceSet, ProviderError};
use crate::index::{NamespaceIndex, SecretEvent};
use crate::store::{ContextHandle, CredentialStore, ScopedStoreCache};

type IndexMap = HashMap<String, Arc<NamespaceIndex>>;

/// Aggregates per-namespace credential indices behind one API
///
/// Construction does not touch the network; watches open on
/// [`start`](Self::start) (or immediately on reconfiguration once
/// started).
pub struct NamespacedCredentialProvider {
    namespaces: RwLock<NamespaceSet>,
    // Copy-on-write: queries iterate either the fully-old or the fully-new
    // set, never a mix.
    indices: ArcSwap<IndexMap>,
    registry: Arc<ConverterRegistry>,
    stores: ScopedStoreCache,
    client: RwLock<Option<Client>>,
    started: AtomicBool,
}

impl NamespacedCredentialProvider {
    /// Creates a provider with no configured namespaces
    pub fn new(registry: ConverterRegistry) -> Arc<Self> {
        Arc::new(Self {
            namespaces: RwLock::new(NamespaceSet::new()),
            indices: ArcSwap::from_pointee(IndexMap::new()),
            registry: Arc::new(registry),
            stores: ScopedStoreCache::default(),
            client: RwLock::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// Creates a provider and configures it in one step
    ///
    /// # Errors
    ///
    /// Rejects the whole batch on the first invalid namespace name.
    pub fn with_namespaces<I, S>(
        registry: ConverterRegistry,
        names: I,
    ) -> Result<Arc<Self>, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let provider = Self::new(registry);
        provider.configure(names)?;
        Ok(provider)
    }

    /// Snapshot of the configured namespace set
    pub fn namespaces(&self) -> NamespaceSet {
        self.namespaces.read().clone()
    }

    /// Replaces the namespace configuration
    ///
    /// All-or-nothing: every name is validated before any state changes;
    /// on failure the previous configuration (and its indices) stays
    /// active. Concurrent calls are serialized; the last one to apply
    /// wins wholesale. On success the active index set is swapped atomically and
    /// the old indices are stopped afterwards, so reads in flight against
    /// the old set still complete against a consistent view. If the
    /// provider is started, watches for the new indices open immediately
    /// (fire-and-forget; this call does not block on connections).
    ///
    /// # Errors
    ///
    /// The specific [`ConfigError`] for the first name that fails
    /// validation.
    pub fn configure<I, S>(&self, names: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let replacement = NamespaceSet::from_names(names)?;

        // Configurations apply one at a time: the index swap, the set
        // update, and stopping the displaced indices must land as one
        // unit, or two racing calls could leave `namespaces` describing
        // one call's set while `indices` holds the other's.
        let mut namespaces = self.namespaces.write();

        let mut fresh = IndexMap::with_capacity(replacement.len());
        for namespace in replacement.iter() {
            fresh.insert(
                namespace.as_str().to_string(),
                Arc::new(NamespaceIndex::new(
                    namespace.clone(),
                    Arc::clone(&self.registry),
                )),
            );
        }
        let fresh = Arc::new(fresh);

        let old = self.indices.swap(Arc::clone(&fresh));
        *namespaces = replacement;

        // Stop old watches only after the swap; their credentials are
        // already invisible to new queries.
        for index in old.values() {
            index.stop();
        }

        if self.started.load(Ordering::Acquire) {
            self.spawn_watches(&fresh);
        }

        info!(namespaces = fresh.len(), "namespace configuration replaced");
        Ok(())
    }

    /// Opens watches for every configured namespace
    ///
    /// Invoked once by the host at a well-defined point in its startup
    /// sequence. Connection establishment and retry happen on background
    /// tasks.
    pub fn start(&self, client: Client) {
        *self.client.write() = Some(client);
        self.started.store(true, Ordering::Release);

        let indices = self.indices.load();
        self.spawn_watches(&indices);
        info!(namespaces = indices.len(), "started watching for secrets");
    }

    /// Stops all watches
    ///
    /// Invoked once by the host during shutdown. Caches are frozen; the
    /// credential collection is rebuilt from the API on the next start.
    pub fn stop(&self) {
        self.started.store(false, Ordering::Release);

        let indices = self.indices.load();
        for index in indices.values() {
            index.stop();
        }
        info!(namespaces = indices.len(), "stopped watching for secrets");
    }

    fn spawn_watches(&self, indices: &IndexMap) {
        let Some(client) = self.client.read().clone() else {
            debug!("no client yet, watches deferred to start()");
            return;
        };

        for index in indices.values() {
            index.spawn_watch(client.clone());
        }
    }

    /// All credentials across every active namespace, optionally filtered
    /// by kind
    ///
    /// Concatenation over an unordered index set: no cross-namespace
    /// ordering is promised. Ids cannot collide across namespaces by
    /// construction.
    pub fn get_credentials(&self, kind: Option<&str>) -> Vec<Arc<dyn Credential>> {
        let indices = self.indices.load();

        let mut all = Vec::new();
        for index in indices.values() {
            all.extend(index.list(kind));
        }
        all
    }

    /// Routes a watch event to the index owning `namespace`
    ///
    /// This is the inbound edge for event sources other than the built-in
    /// watch tasks (tests, replays).
    ///
    /// # Errors
    ///
    /// [`ProviderError::UnknownNamespace`] if the namespace is not in the
    /// active set — a caller/configuration mismatch, never silently
    /// ignored.
    pub fn handle_secret_event(
        &self,
        namespace: &str,
        event: SecretEvent,
    ) -> Result<(), ProviderError> {
        let indices = self.indices.load();
        let index = indices
            .get(namespace)
            .ok_or_else(|| ProviderError::UnknownNamespace {
                namespace: namespace.to_string(),
            })?;

        index.handle_event(event);
        Ok(())
    }

    /// The store bound to this context, created lazily on first request
    pub fn get_store(self: &Arc<Self>, context: &ContextHandle) -> Arc<CredentialStore> {
        self.stores.get_or_create(self, context)
    }

    #[cfg(test)]
    pub(crate) fn store_count(&self) -> usize {
        self.stores.len()
    }
}

impl std::fmt::Debug for NamespacedCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedCredentialProvider")
            .field("namespaces", &*self.namespaces.read())
            .field("started", &self.started.load(Ordering::Acquire))
            .finish()
    }
}
