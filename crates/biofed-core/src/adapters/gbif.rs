use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, GBIF_NAME_MAP, GBIF_OCCURRENCE_MAP};
use crate::http::{encode_filters, FilterValue, QueryExecutor, UrlEscape};
use crate::issues::describe_issues;
use crate::params::{NameRequest, OccRequest};
use crate::policy::ProviderPolicy;
use crate::schema::{
    API_URL_KEY, GBIF_OCC_COUNT_KEY, GBIF_OCC_URL_KEY, GBIF_TAXON_KEY, RANKS, VIEW_URL_KEY,
};
use crate::{ProviderId, ServiceType};

const REST_URL: &str = "https://api.gbif.org/v1";
const VIEW_URL: &str = "https://www.gbif.org";
pub const RECORD_FORMAT_NAME: &str = "https://www.gbif.org/developer/species";
pub const RECORD_FORMAT_OCCURRENCE: &str = "https://www.gbif.org/developer/occurrence";
const PAGE_LIMIT: i64 = 300;
const NOMATCH_VALUE: &str = "none";

/// Occurrence fields GBIF delivers pipe-delimited that normalize to lists.
const PIPE_LIST_FIELDS: &[&str] = &["dwc:associatedSequences", "dwc:associatedReferences"];
/// Occurrence fields GBIF delivers numeric that normalize to strings, so
/// records line up with iDigBio's string-typed index.
const STRINGIFY_FIELDS: &[&str] = &[
    "dwc:year",
    "dwc:month",
    "dwc:day",
    "dwc:decimalLongitude",
    "dwc:decimalLatitude",
];

/// GBIF species-match and occurrence-search adapter. Registered twice,
/// once per service, since GBIF answers both.
pub struct GbifAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
    service: ServiceType,
}

impl GbifAdapter {
    pub fn name_service(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Gbif),
            service: ServiceType::Name,
        }
    }

    pub fn occurrence_service(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Gbif),
            service: ServiceType::Occurrence,
        }
    }

    async fn run_match(&self, request: &NameRequest) -> ProviderResult {
        let filters = [
            ("name", FilterValue::from(request.namestr.trim())),
            ("verbose", FilterValue::from(true)),
        ];
        let url = format!(
            "{REST_URL}/species/match?{}",
            encode_filters(&filters, UrlEscape::Standard)
        );

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Name, ProviderId::Gbif, error),
        };
        let (value, status, url) = match expect_json(ServiceType::Name, ProviderId::Gbif, result) {
            Ok(parts) => parts,
            Err(failure) => return failure,
        };
        let Value::Object(mut output) = value else {
            return ProviderResult::failure(
                ServiceType::Name,
                ProviderId::Gbif,
                Some(status),
                ErrInfo::from_error(format!("unexpected match response shape from {url}")),
            );
        };

        let mut errors = ErrInfo::new();
        let alternatives = match output.remove("alternatives") {
            Some(Value::Array(alts)) => alts,
            _ => Vec::new(),
        };

        let mut candidates = Vec::new();
        match output.get("matchType").and_then(Value::as_str) {
            None => errors.push_error("no matchType element in match response".to_owned()),
            Some(match_type) if match_type.eq_ignore_ascii_case(NOMATCH_VALUE) => {}
            Some(_) => {
                if accept_record(&output, request.is_accepted) {
                    candidates.push(output);
                }
                for alt in alternatives {
                    if let Value::Object(alt) = alt {
                        if accept_record(&alt, request.is_accepted) {
                            candidates.push(alt);
                        }
                    }
                }
            }
        }

        let records = candidates
            .iter()
            .map(standardize_name_record)
            .collect::<Vec<_>>();
        let mut result = ProviderResult::new(
            ServiceType::Name,
            ProviderMeta::new(ProviderId::Gbif, Some(status), vec![url]),
            RECORD_FORMAT_NAME,
            records,
            errors,
        );
        if request.gbif_count {
            self.append_occurrence_counts(&mut result).await;
        }
        result
    }

    /// Annotates each matched name with its backbone occurrence count and
    /// a link to those occurrences.
    async fn append_occurrence_counts(&self, result: &mut ProviderResult) {
        let mut extra_urls = Vec::new();
        for record in &mut result.records {
            let Some(taxon_key) = record.get(GBIF_TAXON_KEY).and_then(scalar_string) else {
                continue;
            };
            let url = format!(
                "{REST_URL}/occurrence/search?{}",
                encode_filters(
                    &[("taxonKey", FilterValue::from(taxon_key))],
                    UrlEscape::Standard
                )
            );
            match self.executor.get(&url, self.policy.timeout_ms()).await {
                Ok(count_result) => {
                    let count = count_result
                        .payload
                        .as_json()
                        .and_then(|value| value.get("count"))
                        .and_then(Value::as_u64);
                    match count {
                        Some(count) => {
                            record.insert(GBIF_OCC_COUNT_KEY.to_owned(), json!(count));
                            record.insert(GBIF_OCC_URL_KEY.to_owned(), json!(url.clone()));
                            extra_urls.push(url);
                        }
                        None => result
                            .errors
                            .push_error(format!("no count element from {url}")),
                    }
                }
                Err(error) => result.errors.push_error(error.message().to_owned()),
            }
        }
        for url in extra_urls {
            result.push_query_url(url);
        }
    }

    async fn run_occurrences(&self, request: &OccRequest) -> ProviderResult {
        let filters: Vec<(&str, FilterValue)> = match (&request.occid, &request.gbif_dataset_key) {
            (_, Some(dataset_key)) => vec![
                ("dataset_key", FilterValue::from(dataset_key.as_str())),
                ("offset", FilterValue::from(0i64)),
                (
                    "limit",
                    FilterValue::from(if request.count_only { 1 } else { PAGE_LIMIT }),
                ),
            ],
            (Some(occid), None) => vec![("occurrenceID", FilterValue::from(occid.as_str()))],
            (None, None) => {
                return ProviderResult::failure(
                    ServiceType::Occurrence,
                    ProviderId::Gbif,
                    Some(400),
                    ErrInfo::from_error(
                        "occurrence query needs an occurrence id or a dataset key".to_owned(),
                    ),
                )
            }
        };
        let url = format!(
            "{REST_URL}/occurrence/search?{}",
            encode_filters(&filters, UrlEscape::Standard)
        );

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Occurrence, ProviderId::Gbif, error),
        };
        let (value, status, url) =
            match expect_json(ServiceType::Occurrence, ProviderId::Gbif, result) {
                Ok(parts) => parts,
                Err(failure) => return failure,
            };

        let mut errors = ErrInfo::new();
        let total = match value.get("count").and_then(Value::as_u64) {
            Some(total) => total as usize,
            None => {
                errors.push_error("missing count element in search response".to_owned());
                0
            }
        };

        let mut records = Vec::new();
        if !request.count_only {
            match value.get("results").and_then(Value::as_array) {
                Some(results) => {
                    for rec in results {
                        if let Value::Object(rec) = rec {
                            records.push(standardize_occurrence_record(rec));
                        }
                    }
                }
                None => errors.push_error("missing results element in search response".to_owned()),
            }
        }

        ProviderResult::counted(
            ServiceType::Occurrence,
            ProviderMeta::new(ProviderId::Gbif, Some(status), vec![url]),
            RECORD_FORMAT_OCCURRENCE,
            total,
            records,
            errors,
        )
    }
}

impl ProviderAdapter for GbifAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gbif
    }

    fn service(&self) -> ServiceType {
        self.service
    }

    fn match_name<'a>(&'a self, request: &'a NameRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_match(request))
    }

    fn occurrences<'a>(&'a self, request: &'a OccRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_occurrences(request))
    }
}

fn accept_record(rec: &Map<String, Value>, accepted_only: bool) -> bool {
    if !accepted_only {
        return true;
    }
    rec.get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status.eq_ignore_ascii_case("accepted"))
}

fn standardize_name_record(rec: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = apply_field_map(&GBIF_NAME_MAP, rec);
    if let Some(key) = rec.get("usageKey").and_then(scalar_string) {
        mapped.insert(VIEW_URL_KEY.to_owned(), json!(format!("{VIEW_URL}/species/{key}")));
        mapped.insert(API_URL_KEY.to_owned(), json!(format!("{REST_URL}/species/{key}")));
    }
    // GBIF delivers ranks as flat fields; fold them into one ordered
    // hierarchy element.
    let mut hierarchy = Map::new();
    for rank in RANKS {
        if let Some(value) = rec.get(rank) {
            hierarchy.insert(rank.to_owned(), value.clone());
        }
    }
    mapped.insert("s2n:hierarchy".to_owned(), json!([hierarchy]));
    mapped
}

fn standardize_occurrence_record(rec: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = apply_field_map(&GBIF_OCCURRENCE_MAP, rec);
    if let Some(id) = rec.get("gbifID").and_then(scalar_string) {
        mapped.insert(VIEW_URL_KEY.to_owned(), json!(format!("{VIEW_URL}/occurrence/{id}")));
        mapped.insert(API_URL_KEY.to_owned(), json!(format!("{REST_URL}/occurrence/{id}")));
    }

    let codes = rec
        .get("issues")
        .and_then(Value::as_array)
        .map(|issues| {
            issues
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    mapped.insert(
        "s2n:issues".to_owned(),
        describe_issues(ProviderId::Gbif, codes),
    );

    for field in PIPE_LIST_FIELDS {
        if let Some(joined) = mapped.get(*field).and_then(Value::as_str) {
            let parts = joined
                .split('|')
                .map(|part| part.trim().to_owned())
                .collect::<Vec<_>>();
            mapped.insert((*field).to_owned(), json!(parts));
        }
    }
    for field in STRINGIFY_FIELDS {
        if let Some(text) = mapped.get(*field).filter(|v| !v.is_null()).and_then(scalar_string) {
            mapped.insert((*field).to_owned(), Value::String(text));
        }
    }
    mapped
}

/// GBIF name-parser call used as a pre-step by the name and map services.
/// Parsing failures fall back to the original string; the query URL is
/// returned for provider metadata when the call went out at all.
pub async fn parse_name(executor: &QueryExecutor, namestr: &str) -> (String, Option<String>) {
    let url = format!(
        "{REST_URL}/parser/name?{}",
        encode_filters(&[("name", FilterValue::from(namestr))], UrlEscape::Standard)
    );
    let timeout_ms = ProviderPolicy::default_for(ProviderId::Gbif).timeout_ms();
    let Ok(result) = executor.get(&url, timeout_ms).await else {
        return (namestr.to_owned(), None);
    };
    let parsed_rec = result
        .payload
        .as_json()
        .and_then(Value::as_array)
        .and_then(|records| {
            records
                .iter()
                .find(|rec| rec.get("parsed").and_then(Value::as_bool) == Some(true))
        });
    let Some(rec) = parsed_rec else {
        return (namestr.to_owned(), Some(result.url));
    };

    let mut name = rec
        .get("canonicalName")
        .and_then(Value::as_str)
        .unwrap_or(namestr);
    // The parser marks uninterpreted leading tokens with "? ".
    if name.starts_with("? ") {
        name = rec
            .get("scientificName")
            .and_then(Value::as_str)
            .unwrap_or(namestr);
    }
    (name.to_owned(), Some(result.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn name_record_gains_urls_and_hierarchy() {
        let rec = obj(json!({
            "usageKey": 2704179,
            "scientificName": "Poa annua L.",
            "canonicalName": "Poa annua",
            "status": "ACCEPTED",
            "kingdom": "Plantae",
            "family": "Poaceae",
            "genus": "Poa",
        }));
        let std = standardize_name_record(&rec);

        assert_eq!(
            std[VIEW_URL_KEY],
            json!("https://www.gbif.org/species/2704179")
        );
        assert_eq!(
            std[API_URL_KEY],
            json!("https://api.gbif.org/v1/species/2704179")
        );
        let hierarchy = std["s2n:hierarchy"].as_array().expect("list");
        assert_eq!(hierarchy[0]["kingdom"], json!("Plantae"));
        assert_eq!(hierarchy[0]["genus"], json!("Poa"));
        assert!(hierarchy[0].get("phylum").is_none());
    }

    #[test]
    fn occurrence_record_expands_issues_and_lists() {
        let rec = obj(json!({
            "gbifID": 1234,
            "issues": ["ZERO_COORDINATE", "unmapped_code"],
            "associatedSequences": "GenBank:AB1 | GenBank:AB2",
            "year": 1999,
            "decimalLatitude": 38.95,
        }));
        let std = standardize_occurrence_record(&rec);

        assert_eq!(
            std[VIEW_URL_KEY],
            json!("https://www.gbif.org/occurrence/1234")
        );
        let issues = std["s2n:issues"].as_object().expect("dict");
        assert!(issues["ZERO_COORDINATE"].as_str().expect("str").len() > 20);
        assert_eq!(issues["unmapped_code"], json!("unmapped_code"));
        assert_eq!(
            std["dwc:associatedSequences"],
            json!(["GenBank:AB1", "GenBank:AB2"])
        );
        assert_eq!(std["dwc:year"], json!("1999"));
        assert_eq!(std["dwc:decimalLatitude"], json!("38.95"));
    }

    #[test]
    fn accepted_filter_checks_status() {
        let accepted = obj(json!({"status": "ACCEPTED"}));
        let synonym = obj(json!({"status": "SYNONYM"}));

        assert!(accept_record(&accepted, true));
        assert!(!accept_record(&synonym, true));
        assert!(accept_record(&synonym, false));
    }
}
