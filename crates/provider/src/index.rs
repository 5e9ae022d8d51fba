//! Per-namespace watch-and-cache engine
//!
//! One [`NamespaceIndex`] exists per configured namespace. It owns a live
//! watch on that namespace's convertible Secrets and a local cache keyed by
//! raw secret name. Watch events mutate the cache; foreground queries read
//! snapshot copies concurrently. A dropped connection is retried with
//! backoff while the cache keeps serving its last known contents
//! (stale-but-available), and a reconnect replaces the whole cache with the
//! freshly listed set.

use std::sync::Arc;

use dashmap::DashMap;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Client;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::convert::{secret_name, ConverterRegistry, KIND_LABEL};
use crate::core::{id, Credential, Namespace};

/// A watch event scoped to one namespace's Secrets
///
/// `Applied` covers both ADDED and MODIFIED deliveries: the contract for
/// either is convert-and-replace. `Restarted` is the full-resync marker
/// carrying the complete freshly-listed set. `Bookmark` only advances the
/// watch progress token and never mutates the cache.
#[derive(Debug, Clone)]
pub enum SecretEvent {
    /// A secret was added or modified
    Applied(Secret),
    /// A secret was deleted
    Deleted(Secret),
    /// The watch (re)connected and listed the full current set
    Restarted(Vec<Secret>),
    /// Watch progress marker; no cache mutation
    Bookmark,
}

impl From<watcher::Event<Secret>> for SecretEvent {
    fn from(event: watcher::Event<Secret>) -> Self {
        match event {
            watcher::Event::Applied(secret) => SecretEvent::Applied(secret),
            watcher::Event::Deleted(secret) => SecretEvent::Deleted(secret),
            watcher::Event::Restarted(secrets) => SecretEvent::Restarted(secrets),
        }
    }
}

/// Lifecycle state of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Constructed; no watch opened yet
    Created,
    /// Watch task running (possibly mid-reconnect)
    Watching,
    /// Watch closed; the cache is frozen and will not mutate again
    Stopped,
}

/// Authoritative, current snapshot of one namespace's convertible Secrets
pub struct NamespaceIndex {
    namespace: Namespace,
    registry: Arc<ConverterRegistry>,
    cache: DashMap<String, Arc<dyn Credential>>,
    // Events within one namespace are processed one at a time; events of
    // different namespaces run concurrently.
    event_guard: Mutex<()>,
    state: Mutex<WatchState>,
    cancel: CancellationToken,
}

impl NamespaceIndex {
    /// Creates an index in the `Created` state; no watch is opened yet
    pub fn new(namespace: Namespace, registry: Arc<ConverterRegistry>) -> Self {
        Self {
            namespace,
            registry,
            cache: DashMap::new(),
            event_guard: Mutex::new(()),
            state: Mutex::new(WatchState::Created),
            cancel: CancellationToken::new(),
        }
    }

    /// The namespace this index covers
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Current lifecycle state
    pub fn state(&self) -> WatchState {
        *self.state.lock()
    }

    /// Number of cached credentials
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Applies one watch event to the cache
    ///
    /// Serialized per index: interleaved ADDED/DELETED handling on the same
    /// key would lose updates. Ignored once the index is stopped.
    pub fn handle_event(&self, event: SecretEvent) {
        let _serialized = self.event_guard.lock();

        if self.state() == WatchState::Stopped {
            debug!(namespace = %self.namespace, "index stopped, dropping event");
            return;
        }

        match event {
            SecretEvent::Applied(secret) => {
                if let Some((key, credential)) = self.convert(&secret) {
                    debug!(
                        namespace = %self.namespace,
                        secret = %key,
                        id = credential.id(),
                        "cached credential"
                    );
                    self.cache.insert(key, credential);
                }
            }
            SecretEvent::Deleted(secret) => {
                // Removal is keyed by the raw secret name, not the prefixed
                // credential id.
                let key = secret_name(&secret);
                if self.cache.remove(&key).is_some() {
                    debug!(namespace = %self.namespace, secret = %key, "evicted credential");
                }
            }
            SecretEvent::Restarted(secrets) => {
                let fresh: Vec<_> = secrets
                    .iter()
                    .filter_map(|secret| self.convert(secret))
                    .collect();
                let count = fresh.len();

                // Full replacement: entries deleted server-side while the
                // connection was down are dropped here.
                self.cache.clear();
                for (key, credential) in fresh {
                    self.cache.insert(key, credential);
                }
                info!(namespace = %self.namespace, count, "resynced credential cache");
            }
            SecretEvent::Bookmark => {}
        }
    }

    /// Converts a secret and rewrites its id to the namespace-global form
    ///
    /// Returns `None` (after logging) for secrets no converter recognizes
    /// and for credentials that refuse the id rewrite.
    fn convert(&self, secret: &Secret) -> Option<(String, Arc<dyn Credential>)> {
        let key = secret_name(secret);

        let mut credential = match self.registry.convert(secret) {
            Ok(credential) => credential,
            Err(err) => {
                warn!(
                    namespace = %self.namespace,
                    secret = %key,
                    error = %err,
                    "skipping secret"
                );
                return None;
            }
        };

        // Idempotent prefixing: a duplicate MODIFIED delivery must not
        // produce "ns_ns_id".
        if !id::is_namespaced(&self.namespace, credential.id()) {
            let global = id::global_id(&self.namespace, credential.id());
            if let Err(err) = credential.set_id(global) {
                error!(
                    namespace = %self.namespace,
                    secret = %key,
                    error = %err,
                    "credential rejected id rewrite, dropping it"
                );
                return None;
            }
        }

        Some((key, Arc::from(credential)))
    }

    /// Snapshot of current credentials, optionally filtered by kind
    ///
    /// Never mutates the cache; safe to call concurrently with event
    /// handling.
    pub fn list(&self, kind: Option<&str>) -> Vec<Arc<dyn Credential>> {
        self.cache
            .iter()
            .filter(|entry| kind.map_or(true, |k| entry.value().kind() == k))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Opens the watch: transitions `Created -> Watching` and spawns the
    /// watch task
    ///
    /// Fire-and-forget: connection establishment, the seeding list, and any
    /// reconnect backoff all happen on the spawned task, never on the
    /// caller. A second call, or a call on a stopped index, is a no-op.
    pub fn spawn_watch(self: &Arc<Self>, client: Client) {
        {
            let mut state = self.state.lock();
            match *state {
                WatchState::Created => *state = WatchState::Watching,
                WatchState::Watching | WatchState::Stopped => return,
            }
        }

        let index = Arc::clone(self);
        tokio::spawn(async move {
            index.watch_loop(client).await;
        });
    }

    async fn watch_loop(self: Arc<Self>, client: Client) {
        let api: Api<Secret> = Api::namespaced(client, self.namespace.as_str());
        // Only convertible secrets: the kind label must be present.
        let config = watcher::Config::default().labels(KIND_LABEL);

        // The initial list arrives as a Restarted event, seeding the cache;
        // connection errors restart the stream with backoff while reads
        // keep serving the previous contents.
        let stream = watcher(api, config).default_backoff();
        tokio::pin!(stream);

        info!(namespace = %self.namespace, "watching secrets");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                event = stream.next() => match event {
                    Some(Ok(event)) => self.handle_event(event.into()),
                    Some(Err(err)) => {
                        warn!(
                            namespace = %self.namespace,
                            error = %err,
                            "watch error, serving cached credentials until reconnect"
                        );
                    }
                    None => break,
                },
            }
        }

        debug!(namespace = %self.namespace, "watch loop exited");
    }

    /// Closes the watch: transitions to `Stopped`
    ///
    /// Safe to call at any point, including mid-reconnect or before the
    /// watch ever started. Does not wait for an in-flight event handler,
    /// but no event is applied after the state flips.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state == WatchState::Stopped {
                return;
            }
            *state = WatchState::Stopped;
        }

        self.cancel.cancel();
        info!(namespace = %self.namespace, "stopped watching secrets");
    }
}

impl std::fmt::Debug for NamespaceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceIndex")
            .field("namespace", &self.namespace)
            .field("state", &self.state())
            .field("cached", &self.cache.len())
            .finish()
    }
}
