use std::sync::Arc;

use tokio::task::JoinSet;

use crate::adapter::AdapterRegistry;
use crate::adapters::parse_name;
use crate::envelope::{AggregateResponse, ProviderResult};
use crate::error::ValidationError;
use crate::http::QueryExecutor;
use crate::params::{NameRequest, ParameterResolver, RawParams};
use crate::policy::ProviderPolicy;
use crate::services::{format_results, missing_adapter, sort_results, timeout_failure};
use crate::ServiceType;

/// Taxon name-match orchestrator over the name-capable providers.
pub struct NameService {
    registry: Arc<AdapterRegistry>,
    executor: QueryExecutor,
}

impl NameService {
    pub fn new(registry: Arc<AdapterRegistry>, executor: QueryExecutor) -> Self {
        Self { registry, executor }
    }

    pub async fn run(&self, raw: &RawParams) -> Result<AggregateResponse, ValidationError> {
        let (mut request, warnings) = ParameterResolver::resolve_name(raw)?;
        let query_term = raw.query_term();

        let mut parser_url = None;
        if request.gbif_parse {
            let (parsed, url) = parse_name(&self.executor, &request.namestr).await;
            request.namestr = parsed;
            parser_url = url;
        }

        let results = format_results(ServiceType::Name, self.fan_out(&request).await);
        let mut response =
            AggregateResponse::of_providers(ServiceType::Name, Some(&query_term), results, warnings);
        if let Some(url) = parser_url {
            response.provider.query_url.push(url);
        }
        Ok(response)
    }

    async fn fan_out(&self, request: &NameRequest) -> Vec<ProviderResult> {
        let mut set = JoinSet::new();
        for provider in request.providers.clone() {
            let adapter = self.registry.adapter_for(provider, ServiceType::Name);
            let request = request.clone();
            set.spawn(async move {
                let Some(adapter) = adapter else {
                    return missing_adapter(ServiceType::Name, provider);
                };
                let policy = ProviderPolicy::default_for(provider);
                match tokio::time::timeout(policy.call_timeout, adapter.match_name(&request)).await
                {
                    Ok(result) => result,
                    Err(_) => timeout_failure(ServiceType::Name, provider, &policy),
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
