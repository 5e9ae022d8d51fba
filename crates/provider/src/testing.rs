//! Test fixtures
//!
//! Builders for labeled Secret objects so credential conversion and event
//! handling can be exercised without a cluster.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use crate::convert::{KIND_LABEL, SCOPE_LABEL};

/// Builds a convertible secret with the given kind label and data payload
pub fn secret_with_data(
    namespace: &str,
    name: &str,
    kind: &str,
    data: &[(&str, &str)],
) -> Secret {
    let mut labels = BTreeMap::new();
    labels.insert(KIND_LABEL.to_string(), kind.to_string());

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..ObjectMeta::default()
        },
        data: Some(
            data.iter()
                .map(|(key, value)| (key.to_string(), ByteString(value.as_bytes().to_vec())))
                .collect(),
        ),
        type_: Some("Opaque".to_string()),
        ..Secret::default()
    }
}

/// Builds a username/password secret
pub fn username_password_secret(namespace: &str, name: &str) -> Secret {
    secret_with_data(
        namespace,
        name,
        crate::convert::builtin::USERNAME_PASSWORD_KIND,
        &[("username", "admin"), ("password", "hunter2")],
    )
}

/// Builds a secret-text secret
pub fn secret_text_secret(namespace: &str, name: &str) -> Secret {
    secret_with_data(
        namespace,
        name,
        crate::convert::builtin::SECRET_TEXT_KIND,
        &[("text", "t0k3n")],
    )
}

/// Marks a secret as system-scoped
pub fn system_scoped(mut secret: Secret) -> Secret {
    secret
        .metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(SCOPE_LABEL.to_string(), "system".to_string());
    secret
}
