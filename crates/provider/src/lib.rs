//! Kubernetes Secrets from many namespaces as one credential collection
//!
//! Maintains a live, per-namespace watch on convertible Secrets and
//! aggregates the resulting typed credentials behind a single provider:
//!
//! - **Namespace-scoped indices** — one watch-and-cache engine per
//!   configured namespace, resynchronized transparently on reconnect.
//! - **Collision-proof ids** — every credential id carries its namespace
//!   as a `"<namespace>_"` prefix, applied exactly once.
//! - **Atomic reconfiguration** — namespace-set replacement either fully
//!   succeeds or is fully rejected with a specific reason; readers always
//!   see a consistent index set.
//! - **Degraded-but-available reads** — transient connectivity problems
//!   are retried with backoff while cached credentials keep serving.
//!
//! # Example
//!
//! ```no_run
//! use kube_namespaced_credentials::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider =
//!     NamespacedCredentialProvider::with_namespaces(ConverterRegistry::builtin(), ["team-a", "team-b"])?;
//!
//! let client = kube::Client::try_default().await?;
//! provider.start(client);
//!
//! for credential in provider.get_credentials(None) {
//!     println!("{}", credential.id());
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

/// Secret-to-credential converters and their registry
pub mod convert;
/// Core types, errors, and primitives
pub mod core;
/// Per-namespace watch-and-cache engine
pub mod index;
/// The aggregating provider
pub mod provider;
/// Per-context stores and their cache
pub mod store;
/// Fixtures for exercising the engine without a cluster
pub mod testing;

pub use crate::convert::{ConverterRegistry, SecretConverter, KIND_LABEL, SCOPE_LABEL};
pub use crate::core::{
    ConfigError, ConversionError, Credential, CredentialScope, IdRewriteError, Namespace,
    NamespaceSet, ProviderError,
};
pub use crate::index::{NamespaceIndex, SecretEvent, WatchState};
pub use crate::provider::NamespacedCredentialProvider;
pub use crate::store::{ContextHandle, CredentialStore, StoreContext};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::convert::builtin::{
        SecretTextCredential, UsernamePasswordCredential, SECRET_TEXT_KIND,
        USERNAME_PASSWORD_KIND,
    };
    pub use crate::convert::{ConverterRegistry, SecretConverter, KIND_LABEL};
    pub use crate::core::{
        ConfigError, Credential, CredentialScope, Namespace, NamespaceSet, ProviderError,
    };
    pub use crate::index::{NamespaceIndex, SecretEvent, WatchState};
    pub use crate::provider::NamespacedCredentialProvider;
    pub use crate::store::{ContextHandle, CredentialStore, StoreContext};
}
