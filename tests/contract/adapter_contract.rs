//! Contract every registered provider adapter must honor: one logical
//! service per instance, never an `Err`, and a well-formed failure
//! envelope on every path it cannot serve.

use std::sync::Arc;

use biofed_core::{
    AdapterRegistry, NoopHttpClient, OccRequest, ProviderId, QueryExecutor, ServiceType,
};

fn registry() -> AdapterRegistry {
    AdapterRegistry::with_executor(QueryExecutor::new(Arc::new(NoopHttpClient)))
}

fn occ_request() -> OccRequest {
    OccRequest {
        occid: Some(String::from("test-occurrence-guid")),
        gbif_dataset_key: None,
        count_only: false,
        providers: Vec::new(),
    }
}

#[test]
fn registry_covers_every_provider_service_pair() {
    let mut registered = registry().registered();
    registered.sort_by_key(|(provider, service)| (provider.as_str(), service.as_str()));

    assert_eq!(
        registered,
        vec![
            (ProviderId::Gbif, ServiceType::Name),
            (ProviderId::Gbif, ServiceType::Occurrence),
            (ProviderId::Idigbio, ServiceType::Occurrence),
            (ProviderId::Ipni, ServiceType::Name),
            (ProviderId::Itis, ServiceType::Name),
            (ProviderId::Lifemapper, ServiceType::Map),
            (ProviderId::Morphosource, ServiceType::Occurrence),
            (ProviderId::Specify, ServiceType::Occurrence),
            (ProviderId::Specify, ServiceType::Resolve),
            (ProviderId::Worms, ServiceType::Name),
        ]
    );
}

#[tokio::test]
async fn unsupported_operation_returns_a_failure_envelope() {
    let registry = registry();
    let adapter = registry
        .adapter_for(ProviderId::Itis, ServiceType::Name)
        .expect("registered");

    let result = adapter.occurrences(&occ_request()).await;

    assert_eq!(result.provider.code, ProviderId::Itis);
    assert_eq!(result.service, ServiceType::Occurrence);
    assert_eq!(result.count, 0);
    assert!(result.errors.has_errors());
    assert!(result.records.is_empty());
}

#[tokio::test]
async fn empty_upstream_payloads_never_panic_an_occurrence_adapter() {
    let registry = registry();
    let request = occ_request();

    for provider in [
        ProviderId::Specify,
        ProviderId::Gbif,
        ProviderId::Idigbio,
        ProviderId::Morphosource,
    ] {
        let adapter = registry
            .adapter_for(provider, ServiceType::Occurrence)
            .expect("registered");
        let result = adapter.occurrences(&request).await;

        assert_eq!(result.provider.code, provider);
        assert_eq!(result.service, ServiceType::Occurrence);
        assert_eq!(result.count, 0);
        assert!(result.records.is_empty());
    }
}

#[tokio::test]
async fn adapter_identity_matches_its_registration() {
    let registry = registry();

    for (provider, service) in registry.registered() {
        let adapter = registry
            .adapter_for(provider, service)
            .expect("registered pair resolves");
        assert_eq!(adapter.id(), provider);
        assert_eq!(adapter.service(), service);
    }
}
