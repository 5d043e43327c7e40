//! Service orchestrators.
//!
//! One orchestrator per logical service. Each resolves raw parameters,
//! fans out to the resolved providers in parallel with a per-provider
//! deadline, and assembles the nested aggregate envelope. A provider
//! failure never aborts its siblings; it lands in that provider's own
//! result envelope.

mod badge;
mod map;
mod name;
mod occ;
mod resolve;

pub use badge::BadgeService;
pub use map::MapService;
pub use name::NameService;
pub use occ::OccurrenceService;
pub use resolve::ResolveService;

use crate::envelope::{ErrInfo, ProviderResult};
use crate::policy::ProviderPolicy;
use crate::schema::SchemaRegistry;
use crate::{ProviderId, ServiceType};

/// Failure envelope for a provider whose adapter is not registered for
/// the service. Reachable only when a caller hand-builds a request with
/// a provider outside the service's registry.
pub(crate) fn missing_adapter(service: ServiceType, provider: ProviderId) -> ProviderResult {
    ProviderResult::failure(
        service,
        provider,
        Some(400),
        ErrInfo::from_error(format!(
            "no adapter registered for provider {provider} and service {service}"
        )),
    )
}

pub(crate) fn timeout_failure(
    service: ServiceType,
    provider: ProviderId,
    policy: &ProviderPolicy,
) -> ProviderResult {
    ProviderResult::failure(
        service,
        provider,
        None,
        ErrInfo::from_error(format!(
            "provider {provider} did not answer within {}ms",
            policy.timeout_ms()
        )),
    )
}

/// Deterministic post-join ordering: specify first, then alphabetical by
/// provider code. Fan-out completion order never leaks into the response.
pub(crate) fn sort_results(results: &mut [ProviderResult]) {
    results.sort_by(|a, b| {
        let a_key = (a.provider.code != ProviderId::Specify, a.provider.code.as_str());
        let b_key = (b.provider.code != ProviderId::Specify, b.provider.code.as_str());
        a_key.cmp(&b_key)
    });
}

/// Rewrite every provider's records against the canonical field catalogue.
pub(crate) fn format_results(
    service: ServiceType,
    mut results: Vec<ProviderResult>,
) -> Vec<ProviderResult> {
    for result in &mut results {
        let records = std::mem::take(&mut result.records);
        result.records = SchemaRegistry::format_records(service, records);
    }
    results
}
