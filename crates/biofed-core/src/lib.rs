//! Core broker engine for biofed.
//!
//! This crate contains:
//! - Service and provider registries with deterministic ordering rules
//! - The canonical namespaced record schema and per-provider field maps
//! - Parameter validation and immutable per-request value objects
//! - The HTTP query executor and one adapter per upstream provider
//! - Response envelopes and the per-service fan-out orchestrators

pub mod adapter;
pub mod adapters;
pub mod envelope;
pub mod error;
pub mod fieldmap;
pub mod http;
pub mod issues;
pub mod params;
pub mod policy;
pub mod provider;
pub mod schema;
pub mod service;
pub mod services;

pub use adapter::{AdapterFuture, AdapterRegistry, ProviderAdapter};
pub use adapters::{
    parse_name, GbifAdapter, IdigbioAdapter, IpniAdapter, ItisAdapter, LifemapperAdapter,
    MorphosourceAdapter, SpecifyAdapter, SpecifyResolverAdapter, WormsAdapter,
};
pub use envelope::{
    icon_url, AggregateRecords, AggregateResponse, ErrInfo, ProviderMeta, ProviderResult,
};
pub use error::{CoreError, ValidationError};
pub use http::{
    encode_filters, FilterValue, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse,
    NoopHttpClient, Payload, QueryError, QueryExecutor, QueryResult, ReqwestHttpClient, UrlEscape,
};
pub use params::{
    BadgeRequest, MapRequest, NameRequest, OccRequest, ParameterResolver, RawParams,
    ResolveRequest,
};
pub use policy::ProviderPolicy;
pub use provider::{order_providers, IconStatus, ProviderId};
pub use schema::{CanonicalField, FieldKind, Namespace, SchemaRegistry};
pub use service::ServiceType;
pub use services::{BadgeService, MapService, NameService, OccurrenceService, ResolveService};
