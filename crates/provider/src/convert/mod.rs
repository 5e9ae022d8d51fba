//! Secret-to-credential conversion
//!
//! Secrets opt in to conversion by carrying the [`KIND_LABEL`] label; its
//! value selects the registered [`SecretConverter`]. Conversion failures
//! are not index errors — the engine logs a warning and skips the secret.

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Secret;

use crate::core::error::ConversionError;
use crate::core::Credential;

/// Label identifying convertible secrets; its value selects the converter
pub const KIND_LABEL: &str = "kube-credentials.io/kind";

/// Optional label overriding the credential scope; value `"system"` hides
/// the credential from per-context stores
pub const SCOPE_LABEL: &str = "kube-credentials.io/scope";

/// Converts one kind of Secret into a typed credential
pub trait SecretConverter: Send + Sync {
    /// The [`KIND_LABEL`] value this converter handles
    fn kind(&self) -> &str;

    /// Converts the secret
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] if required data is missing or
    /// malformed; the caller skips the secret.
    fn convert(&self, secret: &Secret) -> Result<Box<dyn Credential>, ConversionError>;
}

/// Registry of converters, keyed by kind label value
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn SecretConverter>>,
}

impl ConverterRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry preloaded with the builtin converters
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(builtin::UsernamePasswordConverter));
        registry.register(Arc::new(builtin::SecretTextConverter));
        registry
    }

    /// Registers a converter, replacing any previous one for the same kind
    pub fn register(&mut self, converter: Arc<dyn SecretConverter>) {
        self.converters
            .insert(converter.kind().to_string(), converter);
    }

    /// Whether a converter is registered for this kind
    pub fn recognizes(&self, kind: &str) -> bool {
        self.converters.contains_key(kind)
    }

    /// Converts a secret by dispatching on its kind label
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::MissingKindLabel`] if the secret carries
    /// no kind label, [`ConversionError::UnknownKind`] if no converter is
    /// registered for it, or whatever the selected converter reports.
    pub fn convert(&self, secret: &Secret) -> Result<Box<dyn Credential>, ConversionError> {
        let name = secret_name(secret);

        let kind = secret
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(KIND_LABEL))
            .ok_or_else(|| ConversionError::MissingKindLabel {
                secret: name.clone(),
                label: KIND_LABEL,
            })?;

        let converter =
            self.converters
                .get(kind.as_str())
                .ok_or_else(|| ConversionError::UnknownKind {
                    secret: name,
                    kind: kind.clone(),
                })?;

        converter.convert(secret)
    }
}

/// Secret name for logging and error context
pub(crate) fn secret_name(secret: &Secret) -> String {
    secret
        .metadata
        .name
        .clone()
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Extracts a UTF-8 string from the secret's data payload
///
/// Kubernetes delivers `data` values base64-decoded into bytes already;
/// this only validates UTF-8. Falls back to `string_data` (present on
/// objects that were created but not yet round-tripped through the API).
pub(crate) fn data_string(secret: &Secret, key: &str) -> Result<String, ConversionError> {
    if let Some(bytes) = secret.data.as_ref().and_then(|data| data.get(key)) {
        return String::from_utf8(bytes.0.clone()).map_err(|_| ConversionError::InvalidData {
            secret: secret_name(secret),
            reason: format!("data key '{key}' is not valid UTF-8"),
        });
    }

    if let Some(value) = secret.string_data.as_ref().and_then(|data| data.get(key)) {
        return Ok(value.clone());
    }

    Err(ConversionError::MissingDataKey {
        secret: secret_name(secret),
        key: key.to_string(),
    })
}

/// Local credential id for a secret: its object name
pub(crate) fn local_id(secret: &Secret) -> Result<String, ConversionError> {
    secret
        .metadata
        .name
        .clone()
        .ok_or_else(|| ConversionError::InvalidData {
            secret: "<unnamed>".to_string(),
            reason: "secret has no metadata.name".to_string(),
        })
}

/// Reads the credential scope from the scope label, defaulting to global
pub(crate) fn scope_of(secret: &Secret) -> crate::core::CredentialScope {
    use crate::core::CredentialScope;

    let system = secret
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(SCOPE_LABEL))
        .is_some_and(|value| value == "system");

    if system {
        CredentialScope::System
    } else {
        CredentialScope::Global
    }
}
