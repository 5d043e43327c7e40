use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;

use crate::adapter::AdapterRegistry;
use crate::adapters::parse_name;
use crate::envelope::{AggregateResponse, ErrInfo, ProviderResult};
use crate::error::ValidationError;
use crate::http::QueryExecutor;
use crate::params::{MapRequest, NameRequest, ParameterResolver, RawParams};
use crate::policy::ProviderPolicy;
use crate::services::{format_results, missing_adapter, sort_results, timeout_failure};
use crate::{ProviderId, ServiceType};

/// Species-distribution map orchestrator.
///
/// Map providers index layers by accepted scientific name. With
/// `is_accepted=true` the orchestrator matches the name against the
/// GBIF backbone and queries layers for every accepted candidate;
/// otherwise the raw name string is queried as given.
pub struct MapService {
    registry: Arc<AdapterRegistry>,
    executor: QueryExecutor,
}

impl MapService {
    pub fn new(registry: Arc<AdapterRegistry>, executor: QueryExecutor) -> Self {
        Self { registry, executor }
    }

    pub async fn run(&self, raw: &RawParams) -> Result<AggregateResponse, ValidationError> {
        let (mut request, warnings) = ParameterResolver::resolve_map(raw)?;
        let query_term = raw.query_term();

        let mut parser_url = None;
        if request.gbif_parse {
            let (parsed, url) = parse_name(&self.executor, &request.namestr).await;
            request.namestr = parsed;
            parser_url = url;
        }
        let (scinames, mut errors) = self.layer_names(&request).await;
        errors.combine(warnings);

        let results = format_results(
            ServiceType::Map,
            self.fan_out(&request, Arc::new(scinames)).await,
        );
        let mut response =
            AggregateResponse::of_providers(ServiceType::Map, Some(&query_term), results, errors);
        if let Some(url) = parser_url {
            response.provider.query_url.push(url);
        }
        Ok(response)
    }

    /// Names to query layers for. Backbone match failures fall back to
    /// the raw name string so the points layer can still resolve.
    async fn layer_names(&self, request: &MapRequest) -> (Vec<String>, ErrInfo) {
        if !request.is_accepted {
            return (vec![request.namestr.clone()], ErrInfo::new());
        }
        let Some(adapter) = self.registry.adapter_for(ProviderId::Gbif, ServiceType::Name) else {
            return (vec![request.namestr.clone()], ErrInfo::new());
        };
        let name_request = NameRequest {
            namestr: request.namestr.clone(),
            providers: vec![ProviderId::Gbif],
            is_accepted: true,
            gbif_parse: false,
            gbif_count: false,
            kingdom: None,
        };
        let policy = ProviderPolicy::default_for(ProviderId::Gbif);
        let result =
            match tokio::time::timeout(policy.call_timeout, adapter.match_name(&name_request))
                .await
            {
                Ok(result) => result,
                Err(_) => timeout_failure(ServiceType::Name, ProviderId::Gbif, &policy),
            };

        let mut names = result
            .records
            .iter()
            .filter_map(|rec| rec.get("s2n:scientific_name"))
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if names.is_empty() {
            names.push(request.namestr.clone());
        }
        (names, result.errors)
    }

    async fn fan_out(
        &self,
        request: &MapRequest,
        scinames: Arc<Vec<String>>,
    ) -> Vec<ProviderResult> {
        let mut set = JoinSet::new();
        for provider in request.providers.clone() {
            let adapter = self.registry.adapter_for(provider, ServiceType::Map);
            let request = request.clone();
            let scinames = scinames.clone();
            set.spawn(async move {
                let Some(adapter) = adapter else {
                    return missing_adapter(ServiceType::Map, provider);
                };
                let policy = ProviderPolicy::default_for(provider);
                let mut merged: Option<ProviderResult> = None;
                for sciname in scinames.iter() {
                    let result = match tokio::time::timeout(
                        policy.call_timeout,
                        adapter.map_layers(&request, sciname),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => timeout_failure(ServiceType::Map, provider, &policy),
                    };
                    merged = Some(match merged {
                        None => result,
                        Some(acc) => merge_layer_results(acc, result),
                    });
                }
                merged.unwrap_or_else(|| {
                    ProviderResult::failure(
                        ServiceType::Map,
                        provider,
                        None,
                        ErrInfo::from_error("no name to query map layers for".to_owned()),
                    )
                })
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

/// One provider envelope per provider even when several names were
/// queried: records, query URLs and error buckets accumulate.
fn merge_layer_results(mut acc: ProviderResult, next: ProviderResult) -> ProviderResult {
    acc.count += next.count;
    acc.records.extend(next.records);
    acc.provider.query_url.extend(next.provider.query_url);
    acc.errors.combine(next.errors);
    if acc.provider.status_code.is_none() {
        acc.provider.status_code = next.provider.status_code;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AggregateRecords;
    use crate::http::NoopHttpClient;

    fn service() -> MapService {
        let executor = QueryExecutor::new(Arc::new(NoopHttpClient));
        MapService::new(
            Arc::new(AdapterRegistry::with_executor(executor.clone())),
            executor,
        )
    }

    #[tokio::test]
    async fn map_fan_out_reaches_lifemapper() {
        let raw = RawParams::new()
            .set("namestr", "Poa annua")
            .set("is_accepted", "false");
        let response = service().run(&raw).await.expect("valid parameters");

        let AggregateRecords::Providers(results) = &response.records else {
            panic!("nested envelopes expected");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider.code, ProviderId::Lifemapper);
    }

    #[tokio::test]
    async fn invalid_scenario_codes_warn_instead_of_failing() {
        let raw = RawParams::new()
            .set("namestr", "Poa annua")
            .set("scenariocode", "worldclim-curr,bogus-code");
        let response = service().run(&raw).await.expect("valid parameters");
        assert!(!response.errors.warning.is_empty());
    }
}
