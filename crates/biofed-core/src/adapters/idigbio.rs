use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, IDIGBIO_OCCURRENCE_MAP};
use crate::http::QueryExecutor;
use crate::issues::describe_issues;
use crate::params::OccRequest;
use crate::policy::ProviderPolicy;
use crate::schema::{API_URL_KEY, VIEW_URL_KEY};
use crate::{ProviderId, ServiceType};

const SEARCH_URL: &str = "https://search.idigbio.org/v2/search/records";
const VIEW_URL: &str = "https://www.idigbio.org/portal/records";
const DATA_URL: &str = "https://search.idigbio.org/v2/view/records";
pub const RECORD_FORMAT: &str = "https://github.com/idigbio/idigbio-search-api/wiki";
const SEARCH_LIMIT: u64 = 5_000;

const PIPE_LIST_FIELDS: &[&str] = &["dwc:associatedSequences", "dwc:associatedReferences"];

/// iDigBio record-search adapter. The search API takes a JSON record
/// query over POST and answers nested records: verbatim `data` plus the
/// interpreted `indexTerms`.
pub struct IdigbioAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl IdigbioAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Idigbio),
        }
    }

    async fn run_occurrences(&self, request: &OccRequest) -> ProviderResult {
        let Some(occid) = &request.occid else {
            return ProviderResult::failure(
                ServiceType::Occurrence,
                ProviderId::Idigbio,
                Some(400),
                ErrInfo::from_error("occurrence query needs an occurrence id".to_owned()),
            );
        };
        let body = json!({
            "rq": {"occurrenceid": occid},
            "limit": SEARCH_LIMIT,
            "offset": 0,
        });

        let result = match self
            .executor
            .post_json(SEARCH_URL, &body, self.policy.timeout_ms())
            .await
        {
            Ok(result) => result,
            Err(error) => {
                return query_failure(ServiceType::Occurrence, ProviderId::Idigbio, error)
            }
        };
        let (value, status, url) =
            match expect_json(ServiceType::Occurrence, ProviderId::Idigbio, result) {
                Ok(parts) => parts,
                Err(failure) => return failure,
            };

        let mut errors = ErrInfo::new();
        let total = match value.get("itemCount").and_then(Value::as_u64) {
            Some(total) => total as usize,
            None => {
                errors.push_error("missing itemCount element in search response".to_owned());
                0
            }
        };

        let mut records = Vec::new();
        if !request.count_only {
            match value.get("items").and_then(Value::as_array) {
                Some(items) => {
                    for item in items {
                        if let Value::Object(item) = item {
                            records.push(standardize_record(item));
                        }
                    }
                }
                None => errors.push_error("missing items element in search response".to_owned()),
            }
        }

        ProviderResult::counted(
            ServiceType::Occurrence,
            ProviderMeta::new(ProviderId::Idigbio, Some(status), vec![url]),
            RECORD_FORMAT,
            total,
            records,
            errors,
        )
    }
}

impl ProviderAdapter for IdigbioAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Idigbio
    }

    fn service(&self) -> ServiceType {
        ServiceType::Occurrence
    }

    fn occurrences<'a>(&'a self, request: &'a OccRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_occurrences(request))
    }
}

fn standardize_record(item: &Map<String, Value>) -> Map<String, Value> {
    // The verbatim payload lives under `data`; one without it carries
    // nothing worth normalizing.
    let Some(data) = item.get("data").and_then(Value::as_object) else {
        return Map::new();
    };
    let mut mapped = apply_field_map(&IDIGBIO_OCCURRENCE_MAP, data);

    // The uuid, quality flags, and interpreted country code live in the
    // outer record rather than `data`.
    if let Some(uuid) = item.get("uuid").and_then(scalar_string) {
        mapped.insert("idigbio:uuid".to_owned(), json!(uuid));
        mapped.insert(VIEW_URL_KEY.to_owned(), json!(format!("{VIEW_URL}/{uuid}")));
        mapped.insert(API_URL_KEY.to_owned(), json!(format!("{DATA_URL}/{uuid}")));
    }
    let index_terms = item.get("indexTerms").and_then(Value::as_object);
    let flags = index_terms
        .and_then(|terms| terms.get("flags"))
        .and_then(Value::as_array)
        .map(|flags| flags.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    mapped.insert(
        "s2n:issues".to_owned(),
        describe_issues(ProviderId::Idigbio, flags),
    );
    if let Some(country_code) = index_terms.and_then(|terms| terms.get("countrycode")) {
        mapped.insert("dwc:countryCode".to_owned(), country_code.clone());
    }

    for field in PIPE_LIST_FIELDS {
        if let Some(joined) = mapped.get(*field).and_then(Value::as_str) {
            let parts = joined
                .split('|')
                .map(|part| part.trim().to_owned())
                .collect::<Vec<_>>();
            mapped.insert((*field).to_owned(), json!(parts));
        }
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn record_pulls_uuid_flags_and_country_from_outer_layers() {
        let item = obj(json!({
            "uuid": "a362dd2b-0f22-4aa2-bd6b-7aacb0a45a25",
            "data": {
                "dwc:catalogNumber": "KU 12345",
                "dwc:associatedReferences": "doi:10.1/a | doi:10.1/b",
            },
            "indexTerms": {
                "flags": ["geopoint_bounds", "novel_flag"],
                "countrycode": "USA",
            },
        }));
        let std = standardize_record(&item);

        assert_eq!(std["idigbio:uuid"], json!("a362dd2b-0f22-4aa2-bd6b-7aacb0a45a25"));
        assert_eq!(
            std[VIEW_URL_KEY],
            json!("https://www.idigbio.org/portal/records/a362dd2b-0f22-4aa2-bd6b-7aacb0a45a25")
        );
        assert_eq!(std["dwc:catalogNumber"], json!("KU 12345"));
        assert_eq!(std["dwc:countryCode"], json!("USA"));
        assert_eq!(std["dwc:associatedReferences"], json!(["doi:10.1/a", "doi:10.1/b"]));

        let issues = std["s2n:issues"].as_object().expect("dict");
        assert!(issues["geopoint_bounds"].as_str().expect("str").contains("out of bounds"));
        assert_eq!(issues["novel_flag"], json!("novel_flag"));
    }

    #[test]
    fn record_without_data_element_normalizes_to_empty() {
        let item = obj(json!({"uuid": "deadbeef", "indexTerms": {}}));
        assert!(standardize_record(&item).is_empty());
    }
}
