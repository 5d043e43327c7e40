use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{IconStatus, ProviderId, ServiceType};

pub const BROKER_BASE_URL: &str = "https://broker.spcoco.org";
pub const API_ROOT: &str = "/api/v1";

/// Severity-bucketed messages carried by every envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warning: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<String>,
}

impl ErrInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        let mut info = Self::default();
        info.push_error(message);
        info
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.error.push(message.into());
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warning.push(message.into());
    }

    pub fn push_info(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    /// Merge another bucket set into this one, preserving order.
    pub fn combine(&mut self, other: ErrInfo) {
        self.error.extend(other.error);
        self.warning.extend(other.warning);
        self.info.extend(other.info);
    }

    pub fn has_errors(&self) -> bool {
        !self.error.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_empty() && self.warning.is_empty() && self.info.is_empty()
    }
}

/// Provider metadata element of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMeta {
    pub code: ProviderId,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_url: Vec<String>,
}

impl ProviderMeta {
    pub fn new(provider: ProviderId, status_code: Option<u16>, query_url: Vec<String>) -> Self {
        Self {
            code: provider,
            label: provider.label().to_owned(),
            status_code,
            icon_url: icon_url(provider, None),
            query_url,
        }
    }

    /// Broker self-identity stamped on top-level envelopes. Status is 200
    /// if anyone ever sees this.
    pub fn broker(service: ServiceType, query_term: Option<&str>) -> Self {
        let mut url = format!("{}{}/{}", BROKER_BASE_URL, API_ROOT, service.as_str());
        if let Some(term) = query_term {
            url = format!("{url}?{term}");
        }
        Self {
            code: ProviderId::Broker,
            label: ProviderId::Broker.label().to_owned(),
            status_code: Some(200),
            icon_url: icon_url(ProviderId::Broker, None),
            query_url: vec![url],
        }
    }
}

/// Badge-service link for a provider icon, when the provider serves badges.
pub fn icon_url(provider: ProviderId, status: Option<IconStatus>) -> Option<String> {
    if !provider.serves(ServiceType::Badge) {
        return None;
    }
    let mut url = format!(
        "{}{}/badge?provider={}",
        BROKER_BASE_URL,
        API_ROOT,
        provider.as_str()
    );
    if let Some(status) = status {
        url = format!("{url}&icon_status={status}");
    }
    Some(url)
}

/// Result of exactly one provider adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub count: usize,
    pub service: ServiceType,
    pub provider: ProviderMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub record_format: String,
    pub records: Vec<Map<String, Value>>,
    pub errors: ErrInfo,
}

impl ProviderResult {
    pub fn new(
        service: ServiceType,
        provider: ProviderMeta,
        record_format: impl Into<String>,
        records: Vec<Map<String, Value>>,
        errors: ErrInfo,
    ) -> Self {
        Self {
            count: records.len(),
            service,
            provider,
            record_format: record_format.into(),
            records,
            errors,
        }
    }

    /// Like [`ProviderResult::new`] with the provider's reported total,
    /// which exceeds `records.len()` for paged or count-only queries.
    pub fn counted(
        service: ServiceType,
        provider: ProviderMeta,
        record_format: impl Into<String>,
        count: usize,
        records: Vec<Map<String, Value>>,
        errors: ErrInfo,
    ) -> Self {
        Self {
            count,
            service,
            provider,
            record_format: record_format.into(),
            records,
            errors,
        }
    }

    /// Well-formed failure envelope: zero count, no records, at least one
    /// error entry. Used on every abnormal adapter path.
    pub fn failure(
        service: ServiceType,
        provider: ProviderId,
        status_code: Option<u16>,
        mut errors: ErrInfo,
    ) -> Self {
        if errors.error.is_empty() {
            errors.push_error(format!(
                "provider {} failed to respond for service {}",
                provider, service
            ));
        }
        Self {
            count: 0,
            service,
            provider: ProviderMeta::new(provider, status_code, Vec::new()),
            record_format: String::new(),
            records: Vec::new(),
            errors,
        }
    }

    pub fn push_query_url(&mut self, url: impl Into<String>) {
        self.provider.query_url.push(url.into());
    }
}

/// Record payload of a top-level envelope: nested provider envelopes for
/// multi-provider services, flat standard records for resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregateRecords {
    Providers(Vec<ProviderResult>),
    Records(Vec<Map<String, Value>>),
}

impl AggregateRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Providers(results) => results.len(),
            Self::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Top-level aggregate envelope returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub count: usize,
    pub service: ServiceType,
    pub provider: ProviderMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub record_format: String,
    pub records: AggregateRecords,
    pub errors: ErrInfo,
}

impl AggregateResponse {
    pub fn of_providers(
        service: ServiceType,
        query_term: Option<&str>,
        results: Vec<ProviderResult>,
        errors: ErrInfo,
    ) -> Self {
        Self {
            count: results.len(),
            service,
            provider: ProviderMeta::broker(service, query_term),
            record_format: String::new(),
            records: AggregateRecords::Providers(results),
            errors,
        }
    }

    pub fn of_records(
        service: ServiceType,
        query_term: Option<&str>,
        record_format: impl Into<String>,
        records: Vec<Map<String, Value>>,
        errors: ErrInfo,
    ) -> Self {
        Self {
            count: records.len(),
            service,
            provider: ProviderMeta::broker(service, query_term),
            record_format: record_format.into(),
            records: AggregateRecords::Records(records),
            errors,
        }
    }

    /// Terminal failure envelope, produced before any provider is contacted.
    pub fn failure(service: ServiceType, query_term: Option<&str>, errors: ErrInfo) -> Self {
        Self {
            count: 0,
            service,
            provider: ProviderMeta::broker(service, query_term),
            record_format: String::new(),
            records: AggregateRecords::Providers(Vec::new()),
            errors,
        }
    }
}
