use std::sync::Arc;

use crate::adapter::AdapterRegistry;
use crate::envelope::AggregateResponse;
use crate::error::ValidationError;
use crate::params::{ParameterResolver, RawParams};
use crate::policy::ProviderPolicy;
use crate::schema::SchemaRegistry;
use crate::services::{missing_adapter, timeout_failure};
use crate::{ProviderId, ServiceType};

/// ARK identifier resolution. One provider, flat standard records in the
/// envelope rather than nested provider results.
pub struct ResolveService {
    registry: Arc<AdapterRegistry>,
}

impl ResolveService {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    pub async fn run(&self, raw: &RawParams) -> Result<AggregateResponse, ValidationError> {
        let (request, _) = ParameterResolver::resolve_resolve(raw)?;
        let query_term = raw.query_term();

        let policy = ProviderPolicy::default_for(ProviderId::Specify);
        let result = match self
            .registry
            .adapter_for(ProviderId::Specify, ServiceType::Resolve)
        {
            Some(adapter) => {
                match tokio::time::timeout(policy.call_timeout, adapter.resolve(&request.occid))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => timeout_failure(ServiceType::Resolve, ProviderId::Specify, &policy),
                }
            }
            None => missing_adapter(ServiceType::Resolve, ProviderId::Specify),
        };

        let records = SchemaRegistry::format_records(ServiceType::Resolve, result.records);
        let mut response = AggregateResponse::of_records(
            ServiceType::Resolve,
            Some(&query_term),
            result.record_format,
            records,
            result.errors,
        );
        response.provider.query_url.extend(result.provider.query_url);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AggregateRecords;
    use crate::http::{NoopHttpClient, QueryExecutor};

    fn service() -> ResolveService {
        let executor = QueryExecutor::new(Arc::new(NoopHttpClient));
        ResolveService::new(Arc::new(AdapterRegistry::with_executor(executor)))
    }

    #[tokio::test]
    async fn resolve_answers_flat_records() {
        let raw = RawParams::new().set("occid", "2c1becd5-e641-4e83-b3f5-76a55206539a");
        let response = service().run(&raw).await.expect("valid parameters");

        assert!(matches!(response.records, AggregateRecords::Records(_)));
        assert_eq!(response.service, ServiceType::Resolve);
    }

    #[tokio::test]
    async fn missing_occid_is_a_validation_error() {
        let error = service()
            .run(&RawParams::new())
            .await
            .expect_err("occid is required");
        assert!(matches!(
            error,
            ValidationError::MissingRequiredParam { name: "occid" }
        ));
    }
}
