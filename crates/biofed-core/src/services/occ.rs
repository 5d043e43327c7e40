use std::sync::Arc;

use tokio::task::JoinSet;

use crate::adapter::AdapterRegistry;
use crate::envelope::{AggregateResponse, ProviderResult};
use crate::error::ValidationError;
use crate::params::{OccRequest, ParameterResolver, RawParams};
use crate::policy::ProviderPolicy;
use crate::services::{format_results, missing_adapter, sort_results, timeout_failure};
use crate::ServiceType;

/// Specimen-occurrence orchestrator. A dataset-key query reaches GBIF
/// only; an occurrence-id query fans out to every occurrence provider.
pub struct OccurrenceService {
    registry: Arc<AdapterRegistry>,
}

impl OccurrenceService {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    pub async fn run(&self, raw: &RawParams) -> Result<AggregateResponse, ValidationError> {
        let (request, warnings) = ParameterResolver::resolve_occ(raw)?;
        let query_term = raw.query_term();

        let results = format_results(ServiceType::Occurrence, self.fan_out(&request).await);
        Ok(AggregateResponse::of_providers(
            ServiceType::Occurrence,
            Some(&query_term),
            results,
            warnings,
        ))
    }

    async fn fan_out(&self, request: &OccRequest) -> Vec<ProviderResult> {
        let mut set = JoinSet::new();
        for provider in request.providers.clone() {
            let adapter = self.registry.adapter_for(provider, ServiceType::Occurrence);
            let request = request.clone();
            set.spawn(async move {
                let Some(adapter) = adapter else {
                    return missing_adapter(ServiceType::Occurrence, provider);
                };
                let policy = ProviderPolicy::default_for(provider);
                match tokio::time::timeout(policy.call_timeout, adapter.occurrences(&request)).await
                {
                    Ok(result) => result,
                    Err(_) => timeout_failure(ServiceType::Occurrence, provider, &policy),
                }
            });
        }

        let mut results = Vec::with_capacity(request.providers.len());
        while let Some(joined) = set.join_next().await {
            if let Ok(result) = joined {
                results.push(result);
            }
        }
        sort_results(&mut results);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AggregateRecords;
    use crate::http::{NoopHttpClient, QueryExecutor};
    use crate::ProviderId;

    fn service() -> OccurrenceService {
        let executor = QueryExecutor::new(Arc::new(NoopHttpClient));
        OccurrenceService::new(Arc::new(AdapterRegistry::with_executor(executor)))
    }

    #[tokio::test]
    async fn occid_fans_out_specify_first() {
        let raw = RawParams::new().set("occid", "2c1becd5-e641-4e83-b3f5-76a55206539a");
        let response = service().run(&raw).await.expect("valid parameters");

        let AggregateRecords::Providers(results) = &response.records else {
            panic!("nested envelopes expected");
        };
        let codes = results
            .iter()
            .map(|result| result.provider.code)
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec![
                ProviderId::Specify,
                ProviderId::Gbif,
                ProviderId::Idigbio,
                ProviderId::Morphosource,
            ]
        );
    }

    #[tokio::test]
    async fn dataset_key_restricts_the_fan_out_to_gbif() {
        let raw =
            RawParams::new().set("gbif_dataset_key", "e635240a-3cb1-4d26-ab87-57d8c7afdfdb");
        let response = service().run(&raw).await.expect("valid parameters");

        let AggregateRecords::Providers(results) = &response.records else {
            panic!("nested envelopes expected");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider.code, ProviderId::Gbif);
    }

    #[tokio::test]
    async fn missing_identifiers_are_a_validation_error() {
        let error = service()
            .run(&RawParams::new())
            .await
            .expect_err("occid or dataset key required");
        assert!(matches!(
            error,
            ValidationError::MissingRequiredParam { name: "occid" }
        ));
    }
}
