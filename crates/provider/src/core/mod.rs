//! Core types for the namespaced credential provider

mod credential;
pub mod error;
pub mod id;
mod namespace;

pub use credential::{Credential, CredentialScope};
pub use error::{ConfigError, ConversionError, IdRewriteError, ProviderError, Result};
pub use namespace::{Namespace, NamespaceSet, NAMESPACE_NAME_MAX_LENGTH};
