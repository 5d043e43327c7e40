use serde_json::{Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{
    apply_field_map, SPECIFY_CACHE_OCCURRENCE_MAP, SPECIFY_OCCURRENCE_MAP, SPECIFY_RESOLVER_MAP,
};
use crate::http::QueryExecutor;
use crate::params::OccRequest;
use crate::policy::ProviderPolicy;
use crate::{ProviderId, ServiceType};

const RESOLVER_URL: &str = "https://syftorium.org/api/v1";
const RESOLVE_RESOURCE: &str = "resolve";
pub const OCCURRENCE_RECORD_FORMAT: &str = "http://rs.tdwg.org/dwc.json";
pub const RESOLVER_RECORD_FORMAT: &str = "https://syftorium.org/api/v1";

/// Specify occurrence adapter. A record is located in two hops: the ARK
/// resolver maps the occurrence identifier to the publishing server's
/// direct record URL, then that URL is fetched. Records cataloged in the
/// resolver without a reachable server carry a non-http URL and yield an
/// empty result rather than a failure.
pub struct SpecifyAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl SpecifyAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Specify),
        }
    }

    /// ARK lookup reduced to the record URL, or `None` when the guid is
    /// not cataloged or the resolver is unreachable.
    async fn resolve_record_url(&self, occid: &str) -> Option<String> {
        let url = ark_url(occid);
        let result = self.executor.get(&url, self.policy.timeout_ms()).await.ok()?;
        let rec = result.payload.as_json()?.as_object()?;
        rec.get("url").and_then(scalar_string)
    }

    async fn run_occurrences(&self, request: &OccRequest) -> ProviderResult {
        let Some(occid) = request.occid.as_deref() else {
            let mut errors = ErrInfo::new();
            errors.push_error("no occurrence identifier given".to_owned());
            return ProviderResult::failure(
                ServiceType::Occurrence,
                ProviderId::Specify,
                Some(400),
                errors,
            );
        };

        let record_url = self.resolve_record_url(occid).await;
        let Some(record_url) = record_url.filter(|url| url.starts_with("http")) else {
            let mut errors = ErrInfo::new();
            errors.push_info(format!("no direct record URL for {occid}"));
            return ProviderResult::new(
                ServiceType::Occurrence,
                ProviderMeta::new(ProviderId::Specify, None, Vec::new()),
                OCCURRENCE_RECORD_FORMAT,
                Vec::new(),
                errors,
            );
        };

        let result = match self
            .executor
            .get(&record_url, self.policy.timeout_ms())
            .await
        {
            Ok(result) => result,
            Err(error) => {
                return query_failure(ServiceType::Occurrence, ProviderId::Specify, error)
            }
        };
        let (value, status, url) =
            match expect_json(ServiceType::Occurrence, ProviderId::Specify, result) {
                Ok(parts) => parts,
                Err(failure) => return failure,
            };

        let mut records = Vec::new();
        if let Some(rec) = extract_record(&value) {
            if !rec.is_empty() && !request.count_only {
                records.push(standardize_record(&value, rec));
            }
        }
        let total = usize::from(extract_record(&value).map_or(false, |rec| !rec.is_empty()));

        ProviderResult::counted(
            ServiceType::Occurrence,
            ProviderMeta::new(ProviderId::Specify, Some(status), vec![url]),
            OCCURRENCE_RECORD_FORMAT,
            total,
            records,
            ErrInfo::new(),
        )
    }
}

impl ProviderAdapter for SpecifyAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Specify
    }

    fn service(&self) -> ServiceType {
        ServiceType::Occurrence
    }

    fn occurrences<'a>(&'a self, request: &'a OccRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_occurrences(request))
    }
}

fn ark_url(occid: &str) -> String {
    format!("{RESOLVER_URL}/{RESOLVE_RESOURCE}/{}", urlencoding::encode(occid))
}

/// Specify 7 servers wrap the record in a `core` element; the specimen
/// cache answers the bare record.
fn extract_record(value: &Value) -> Option<&Map<String, Value>> {
    match value.get("core") {
        Some(core) => core.as_object(),
        None => value.as_object(),
    }
}

fn standardize_record(value: &Value, rec: &Map<String, Value>) -> Map<String, Value> {
    if value.get("core").is_some() {
        apply_field_map(&SPECIFY_OCCURRENCE_MAP, rec)
    } else {
        standardize_cache_record(rec)
    }
}

/// Cache records carry integer date and coordinate elements; these are
/// stringified to line up with iDigBio's representation.
fn standardize_cache_record(rec: &Map<String, Value>) -> Map<String, Value> {
    const TO_STR_FIELDS: &[&str] = &[
        "dwc:year",
        "dwc:month",
        "dwc:day",
        "dwc:decimalLongitude",
        "dwc:decimalLatitude",
    ];
    let mut mapped = apply_field_map(&SPECIFY_CACHE_OCCURRENCE_MAP, rec);
    for key in TO_STR_FIELDS {
        if let Some(value) = mapped.get_mut(*key) {
            if let Value::Number(number) = value {
                *value = Value::String(number.to_string());
            }
        }
    }
    mapped
}

/// Specify ARK resolver adapter for the resolve service.
pub struct SpecifyResolverAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl SpecifyResolverAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Specify),
        }
    }

    async fn run_resolve(&self, occid: &str) -> ProviderResult {
        let url = ark_url(occid);
        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Resolve, ProviderId::Specify, error),
        };
        let (value, status, url) =
            match expect_json(ServiceType::Resolve, ProviderId::Specify, result) {
                Ok(parts) => parts,
                Err(failure) => return failure,
            };

        let mut records = Vec::new();
        if let Some(rec) = value.as_object() {
            if !rec.is_empty() {
                records.push(apply_field_map(&SPECIFY_RESOLVER_MAP, rec));
            }
        }

        ProviderResult::new(
            ServiceType::Resolve,
            ProviderMeta::new(ProviderId::Specify, Some(status), vec![url]),
            RESOLVER_RECORD_FORMAT,
            records,
            ErrInfo::new(),
        )
    }
}

impl ProviderAdapter for SpecifyResolverAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Specify
    }

    fn service(&self) -> ServiceType {
        ServiceType::Resolve
    }

    fn resolve<'a>(&'a self, occid: &'a str) -> AdapterFuture<'a> {
        Box::pin(self.run_resolve(occid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ark_url_escapes_the_guid() {
        assert_eq!(
            ark_url("urn:uuid:abc"),
            "https://syftorium.org/api/v1/resolve/urn%3Auuid%3Aabc"
        );
    }

    #[test]
    fn sp7_record_is_unwrapped_from_core() {
        let value = json!({
            "core": {
                "http://rs.tdwg.org/dwc/terms/catalogNumber": "12345",
                "http://rs.tdwg.org/dwc/terms/basisOfRecord": "PreservedSpecimen",
            }
        });
        let rec = extract_record(&value).expect("record");
        let std = standardize_record(&value, rec);

        assert_eq!(std["dwc:catalogNumber"], json!("12345"));
        assert_eq!(std["dwc:basisOfRecord"], json!("PreservedSpecimen"));
    }

    #[test]
    fn cache_record_stringifies_dates_and_coordinates() {
        let value = json!({
            "catalogNumber": "9981",
            "identifier": "spec-1",
            "year": 2001,
            "decimalLatitude": -38.9,
        });
        let rec = extract_record(&value).expect("record");
        let std = standardize_record(&value, rec);

        assert_eq!(std["dwc:catalogNumber"], json!("9981"));
        assert_eq!(std["s2n:specify_identifier"], json!("spec-1"));
        assert_eq!(std["dwc:year"], json!("2001"));
        assert_eq!(std["dwc:decimalLatitude"], json!("-38.9"));
    }

    #[test]
    fn resolver_record_maps_ark_elements() {
        let rec = json!({
            "id": "abc-def",
            "who": "KU",
            "what": "PreservedSpecimen",
            "when": "2021-02-01",
            "where": "http://n2t.net/ark:/12345/abc",
            "url": "https://hosted.specify.org/export/record/abc-def",
        });
        let std = apply_field_map(&SPECIFY_RESOLVER_MAP, rec.as_object().expect("object"));

        assert_eq!(std["s2n:ident"], json!("abc-def"));
        assert_eq!(std["dwc:institutionCode"], json!("KU"));
        assert_eq!(std["s2n:ark"], json!("http://n2t.net/ark:/12345/abc"));
        assert_eq!(
            std["s2n:api_url"],
            json!("https://hosted.specify.org/export/record/abc-def")
        );
    }
}
