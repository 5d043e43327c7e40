//! Small helpers shared by the adapter modules.

use serde_json::Value;

use crate::envelope::{ErrInfo, ProviderResult};
use crate::http::{Payload, QueryError, QueryResult};
use crate::{ProviderId, ServiceType};

/// Failure envelope from a classified query error, keeping the upstream
/// status when one was seen.
pub(crate) fn query_failure(
    service: ServiceType,
    provider: ProviderId,
    error: QueryError,
) -> ProviderResult {
    ProviderResult::failure(
        service,
        provider,
        error.status().or(Some(500)),
        ErrInfo::from_error(error.message().to_owned()),
    )
}

/// Unwraps a JSON payload, turning an XML answer into a failure envelope
/// for services that only speak JSON.
pub(crate) fn expect_json(
    service: ServiceType,
    provider: ProviderId,
    result: QueryResult,
) -> Result<(Value, u16, String), ProviderResult> {
    match result.payload {
        Payload::Json(value) => Ok((value, result.status, result.url)),
        Payload::Xml(_) => Err(ProviderResult::failure(
            service,
            provider,
            Some(result.status),
            ErrInfo::from_error(format!(
                "expected JSON but received markup from {}",
                result.url
            )),
        )),
    }
}

/// Stringifies scalar JSON values the way providers mix numbers and
/// strings for the same field.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
