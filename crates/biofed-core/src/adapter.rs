use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapters::{
    GbifAdapter, IdigbioAdapter, IpniAdapter, ItisAdapter, LifemapperAdapter, MorphosourceAdapter,
    SpecifyAdapter, SpecifyResolverAdapter, WormsAdapter,
};
use crate::envelope::{ErrInfo, ProviderResult};
use crate::http::QueryExecutor;
use crate::params::{MapRequest, NameRequest, OccRequest};
use crate::{ProviderId, ServiceType};

pub type AdapterFuture<'a> = Pin<Box<dyn Future<Output = ProviderResult> + Send + 'a>>;

/// Provider adapter contract.
///
/// An adapter owns the wire format of one upstream system and returns a
/// normalized [`ProviderResult`] from every call, success or failure.
/// Adapters never return `Err`: an upstream problem becomes a failure
/// envelope so one broken provider cannot sink a fan-out.
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// The single logical service this adapter instance answers.
    fn service(&self) -> ServiceType;

    fn match_name<'a>(&'a self, _request: &'a NameRequest) -> AdapterFuture<'a> {
        unsupported(self.id(), ServiceType::Name)
    }

    fn occurrences<'a>(&'a self, _request: &'a OccRequest) -> AdapterFuture<'a> {
        unsupported(self.id(), ServiceType::Occurrence)
    }

    /// Map layers for a name already resolved to its accepted form.
    fn map_layers<'a>(&'a self, _request: &'a MapRequest, _namestr: &'a str) -> AdapterFuture<'a> {
        unsupported(self.id(), ServiceType::Map)
    }

    fn resolve<'a>(&'a self, _occid: &'a str) -> AdapterFuture<'a> {
        unsupported(self.id(), ServiceType::Resolve)
    }
}

fn unsupported(provider: ProviderId, service: ServiceType) -> AdapterFuture<'static> {
    Box::pin(async move {
        ProviderResult::failure(
            service,
            provider,
            Some(400),
            ErrInfo::from_error(format!(
                "provider {provider} does not serve {service} requests"
            )),
        )
    })
}

/// Adapter registry keyed by provider and service.
///
/// Specify contributes two adapters, one for the portal occurrence API and
/// one for the ARK resolver, so lookup is by the pair rather than the
/// provider alone.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    /// The full production adapter set sharing one query executor.
    pub fn with_executor(executor: QueryExecutor) -> Self {
        Self::new(vec![
            Arc::new(GbifAdapter::name_service(executor.clone())),
            Arc::new(GbifAdapter::occurrence_service(executor.clone())),
            Arc::new(ItisAdapter::new(executor.clone())),
            Arc::new(WormsAdapter::new(executor.clone())),
            Arc::new(IpniAdapter::new(executor.clone())),
            Arc::new(IdigbioAdapter::new(executor.clone())),
            Arc::new(MorphosourceAdapter::new(executor.clone())),
            Arc::new(SpecifyAdapter::new(executor.clone())),
            Arc::new(SpecifyResolverAdapter::new(executor.clone())),
            Arc::new(LifemapperAdapter::new(executor)),
        ])
    }

    pub fn adapter_for(
        &self,
        provider: ProviderId,
        service: ServiceType,
    ) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.id() == provider && adapter.service() == service)
            .cloned()
    }

    pub fn registered(&self) -> Vec<(ProviderId, ServiceType)> {
        self.adapters
            .iter()
            .map(|adapter| (adapter.id(), adapter.service()))
            .collect()
    }
}
