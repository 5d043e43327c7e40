use serde_json::{json, Map};

use crate::envelope::{icon_url, AggregateResponse, ErrInfo};
use crate::error::ValidationError;
use crate::params::{ParameterResolver, RawParams};
use crate::ServiceType;

/// Provider badge lookup. Purely registry-driven, no provider I/O: the
/// response describes the icon file a GUI should fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadgeService;

impl BadgeService {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, raw: &RawParams) -> Result<AggregateResponse, ValidationError> {
        let (request, warnings) = ParameterResolver::resolve_badge(raw)?;
        let query_term = raw.query_term();

        let Some(icon_file) = request.provider.icon_file(request.icon_status) else {
            return Ok(AggregateResponse::failure(
                ServiceType::Badge,
                Some(&query_term),
                ErrInfo::from_error(format!(
                    "provider {} has no {} icon",
                    request.provider, request.icon_status
                )),
            ));
        };

        let mut record = Map::new();
        record.insert("provider".to_owned(), json!(request.provider));
        record.insert("icon_status".to_owned(), json!(request.icon_status));
        record.insert("icon_file".to_owned(), json!(icon_file));
        record.insert(
            "icon_url".to_owned(),
            json!(icon_url(request.provider, Some(request.icon_status))),
        );

        Ok(AggregateResponse::of_records(
            ServiceType::Badge,
            Some(&query_term),
            ServiceType::Badge.record_format().unwrap_or_default(),
            vec![record],
            warnings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AggregateRecords;

    #[test]
    fn badge_resolves_an_icon_descriptor() {
        let raw = RawParams::new()
            .set("provider", "gbif")
            .set("icon_status", "active");
        let response = BadgeService::new().run(&raw).expect("valid parameters");

        let AggregateRecords::Records(records) = &response.records else {
            panic!("flat records expected");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["icon_file"], json!("gbif_active-01.png"));
        assert_eq!(response.record_format, "image/png");
    }

    #[test]
    fn provider_without_the_requested_icon_yields_a_failure_envelope() {
        let raw = RawParams::new()
            .set("provider", "worms")
            .set("icon_status", "hover");
        let response = BadgeService::new().run(&raw).expect("parameters are valid");
        assert_eq!(response.count, 0);
        assert!(response.errors.has_errors());
    }

    #[test]
    fn missing_icon_status_is_a_validation_error() {
        let raw = RawParams::new().set("provider", "gbif");
        let error = BadgeService::new().run(&raw).expect_err("icon_status required");
        assert!(matches!(
            error,
            ValidationError::MissingRequiredParam { name: "icon_status" }
        ));
    }
}
