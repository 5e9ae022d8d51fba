//! Integration tests for the aggregating provider
//!
//! Events are injected through `handle_secret_event`, the same edge the
//! watch tasks use, so the whole pipeline — conversion, id namespacing,
//! caching, aggregation — runs without a cluster.

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use kube_namespaced_credentials::prelude::*;
use kube_namespaced_credentials::testing::{
    secret_text_secret, system_scoped, username_password_secret,
};

fn provider(names: &[&str]) -> Arc<NamespacedCredentialProvider> {
    NamespacedCredentialProvider::with_namespaces(ConverterRegistry::builtin(), names).unwrap()
}

fn credential_ids(provider: &NamespacedCredentialProvider) -> BTreeSet<String> {
    provider
        .get_credentials(None)
        .iter()
        .map(|credential| credential.id().to_string())
        .collect()
}

#[derive(Debug)]
struct Folder {
    name: String,
}

impl StoreContext for Folder {
    fn name(&self) -> &str {
        &self.name
    }
}

fn folder(name: &str) -> ContextHandle {
    Arc::new(Folder {
        name: name.to_string(),
    })
}

#[test]
fn two_namespace_end_to_end_flow() {
    // GIVEN: A provider configured with two namespaces
    let provider = provider(&["test1", "test2"]);

    // WHEN: A secret is added in each namespace
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "s1")),
        )
        .unwrap();
    provider
        .handle_secret_event(
            "test2",
            SecretEvent::Applied(username_password_secret("test2", "s2")),
        )
        .unwrap();

    // THEN: Both appear, each under its own namespace prefix
    assert_eq!(
        credential_ids(&provider),
        BTreeSet::from(["test1_s1".to_string(), "test2_s2".to_string()])
    );

    // WHEN: The first secret is deleted
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Deleted(username_password_secret("test1", "s1")),
        )
        .unwrap();

    // THEN: Only the second remains
    assert_eq!(
        credential_ids(&provider),
        BTreeSet::from(["test2_s2".to_string()])
    );

    // AND: An event for a never-configured namespace is a distinct error
    let err = provider
        .handle_secret_event(
            "test3",
            SecretEvent::Applied(username_password_secret("test3", "s3")),
        )
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownNamespace { .. }));
}

#[test]
fn redelivered_added_event_is_idempotent() {
    let provider = provider(&["test1"]);
    let secret = username_password_secret("test1", "s1");

    provider
        .handle_secret_event("test1", SecretEvent::Applied(secret.clone()))
        .unwrap();
    provider
        .handle_secret_event("test1", SecretEvent::Applied(secret))
        .unwrap();

    // Never "test1_test1_s1".
    assert_eq!(
        credential_ids(&provider),
        BTreeSet::from(["test1_s1".to_string()])
    );
}

#[test]
fn removing_a_namespace_evicts_its_credentials() {
    let provider = provider(&["test1", "test2"]);
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "s1")),
        )
        .unwrap();
    provider
        .handle_secret_event(
            "test2",
            SecretEvent::Applied(username_password_secret("test2", "s2")),
        )
        .unwrap();

    provider.configure(["test2"]).unwrap();

    // test1's credentials are gone from subsequent queries; test2 starts
    // fresh and reseeds from its (re)listed secrets.
    assert!(credential_ids(&provider).is_empty());
    provider
        .handle_secret_event(
            "test2",
            SecretEvent::Restarted(vec![username_password_secret("test2", "s2")]),
        )
        .unwrap();
    assert_eq!(
        credential_ids(&provider),
        BTreeSet::from(["test2_s2".to_string()])
    );

    let err = provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "s1")),
        )
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownNamespace { .. }));
}

#[test]
fn invalid_batch_leaves_configuration_untouched() {
    let provider = provider(&["test1"]);

    let too_long = "a".repeat(64);
    for (names, expected) in [
        (vec!["test1", ""], "blank"),
        (vec!["test1", too_long.as_str()], "too long"),
        (vec!["-test1"], "leading dash"),
        (vec!["test1-"], "trailing dash"),
        (vec!["Test1"], "invalid character"),
    ] {
        let result = provider.configure(names);
        assert!(result.is_err(), "batch should be rejected: {expected}");
        assert!(
            provider.namespaces().contains("test1"),
            "previous configuration must remain active after a {expected} rejection"
        );
        assert_eq!(provider.namespaces().len(), 1);
    }
}

#[test]
fn kind_filter_narrows_aggregated_results() {
    let provider = provider(&["test1", "test2"]);
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "up")),
        )
        .unwrap();
    provider
        .handle_secret_event(
            "test2",
            SecretEvent::Applied(secret_text_secret("test2", "txt")),
        )
        .unwrap();

    let texts = provider.get_credentials(Some(SECRET_TEXT_KIND));
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].id(), "test2_txt");

    assert_eq!(provider.get_credentials(None).len(), 2);
}

#[test]
fn store_serves_global_scope_only() {
    let provider = provider(&["test1"]);
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "visible")),
        )
        .unwrap();
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(system_scoped(secret_text_secret("test1", "hidden"))),
        )
        .unwrap();

    // The provider's aggregate view sees both...
    assert_eq!(provider.get_credentials(None).len(), 2);

    // ...but a per-context store only exposes global-scope credentials.
    let store = provider.get_store(&folder("jobs"));
    let visible: Vec<_> = store
        .credentials()
        .iter()
        .map(|credential| credential.id().to_string())
        .collect();
    assert_eq!(visible, vec!["test1_visible".to_string()]);
}

#[test]
fn store_identity_semantics() {
    let provider = provider(&["test1"]);

    let ctx = folder("jobs");
    let first = provider.get_store(&ctx);
    let second = provider.get_store(&Arc::clone(&ctx));
    assert!(
        Arc::ptr_eq(&first, &second),
        "same context handle must yield the same store"
    );

    let other = provider.get_store(&folder("jobs"));
    assert!(
        !Arc::ptr_eq(&first, &other),
        "distinct handles must yield distinct stores even when semantically equal"
    );
}

#[test]
fn resync_drops_entries_deleted_while_disconnected() {
    let provider = provider(&["test1"]);
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "kept")),
        )
        .unwrap();
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "dropped")),
        )
        .unwrap();

    // Reconnect: the fresh list no longer contains "dropped" — no DELETED
    // event was ever observed for it.
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Restarted(vec![username_password_secret("test1", "kept")]),
        )
        .unwrap();

    assert_eq!(
        credential_ids(&provider),
        BTreeSet::from(["test1_kept".to_string()])
    );
}

#[test]
fn unconvertible_secret_does_not_poison_the_stream() {
    let provider = provider(&["test1"]);

    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(kube_namespaced_credentials::testing::secret_with_data(
                "test1",
                "mystery",
                "unregistered-kind",
                &[],
            )),
        )
        .unwrap();
    provider
        .handle_secret_event(
            "test1",
            SecretEvent::Applied(username_password_secret("test1", "s1")),
        )
        .unwrap();

    assert_eq!(
        credential_ids(&provider),
        BTreeSet::from(["test1_s1".to_string()])
    );
}

#[test]
fn namespace_configuration_survives_serde_round_trip() {
    // Only the namespace list is persisted; credentials are always rebuilt
    // from the API.
    let provider = provider(&["test1", "test2"]);
    let json = serde_json::to_string(&provider.namespaces()).unwrap();

    let restored: NamespaceSet = serde_json::from_str(&json).unwrap();
    let reloaded =
        NamespacedCredentialProvider::with_namespaces(ConverterRegistry::builtin(), restored.iter().map(Namespace::as_str))
            .unwrap();

    assert_eq!(reloaded.namespaces(), provider.namespaces());
}
