use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, ITIS_NAME_MAP};
use crate::http::{encode_filters, FilterValue, QueryExecutor, UrlEscape};
use crate::params::NameRequest;
use crate::policy::ProviderPolicy;
use crate::schema::{API_URL_KEY, RANKS, VIEW_URL_KEY};
use crate::{ProviderId, ServiceType};

const SOLR_URL: &str = "https://services.itis.gov";
const VIEW_URL: &str = "https://www.itis.gov/servlet/SingleRpt/SingleRpt";
pub const RECORD_FORMAT: &str = "https://www.itis.gov/solr_documentation.html";

/// Usage values counted as accepted. ITIS marks kingdom Plantae records
/// valid/invalid and everything else accepted/not accepted.
const GOOD_STATUSES: &[&str] = &["accepted", "valid"];

/// ITIS Solr taxonomy adapter.
pub struct ItisAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl ItisAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Itis),
        }
    }

    async fn run_match(&self, request: &NameRequest) -> ProviderResult {
        let mut q = format!("nameWInd:{}", request.namestr.trim());
        if let Some(kingdom) = &request.kingdom {
            q = format!("{q} AND kingdom:{kingdom}");
        }
        // The Solr endpoint rejects standard percent-encoding; it takes
        // backslash-escaped sequences instead.
        let url = format!(
            "{SOLR_URL}/?{}",
            encode_filters(
                &[("q", FilterValue::from(q)), ("wt", FilterValue::from("json"))],
                UrlEscape::SolrManual
            )
        );

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Name, ProviderId::Itis, error),
        };
        let (value, status, url) = match expect_json(ServiceType::Name, ProviderId::Itis, result) {
            Ok(parts) => parts,
            Err(failure) => return failure,
        };
        let Some(response) = value.get("response") else {
            return ProviderResult::failure(
                ServiceType::Name,
                ProviderId::Itis,
                Some(status),
                ErrInfo::from_error("missing response element in Solr output".to_owned()),
            );
        };

        let mut errors = ErrInfo::new();
        let total = match response.get("numFound").and_then(Value::as_u64) {
            Some(total) => total as usize,
            None => {
                errors.push_error("missing numFound element in Solr output".to_owned());
                0
            }
        };
        let mut records = Vec::new();
        match response.get("docs").and_then(Value::as_array) {
            Some(docs) => {
                for doc in docs {
                    if let Value::Object(doc) = doc {
                        if let Some(rec) = standardize_record(doc, request.is_accepted) {
                            records.push(rec);
                        }
                    }
                }
            }
            None => errors.push_error("missing docs element in Solr output".to_owned()),
        }

        ProviderResult::counted(
            ServiceType::Name,
            ProviderMeta::new(ProviderId::Itis, Some(status), vec![url]),
            RECORD_FORMAT,
            total,
            records,
            errors,
        )
    }
}

impl ProviderAdapter for ItisAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Itis
    }

    fn service(&self) -> ServiceType {
        ServiceType::Name
    }

    fn match_name<'a>(&'a self, request: &'a NameRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_match(request))
    }
}

fn standardize_record(doc: &Map<String, Value>, accepted_only: bool) -> Option<Map<String, Value>> {
    let usage = doc
        .get("usage")
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if accepted_only && !GOOD_STATUSES.contains(&usage.as_str()) {
        return None;
    }

    let mut mapped = apply_field_map(&ITIS_NAME_MAP, doc);
    if let Some(tsn) = doc.get("tsn").and_then(scalar_string) {
        mapped.insert(
            VIEW_URL_KEY.to_owned(),
            json!(format!("{VIEW_URL}?search_topic=TSN&search_value={tsn}")),
        );
        mapped.insert(API_URL_KEY.to_owned(), json!(format!("{SOLR_URL}?q=tsn:{tsn}")));
    }
    mapped.insert(
        "s2n:hierarchy".to_owned(),
        json!(parse_hierarchies(doc.get("hierarchySoFarWRanks"))),
    );
    mapped.insert(
        "s2n:synonyms".to_owned(),
        json!(parse_synonyms(doc.get("synonyms"))),
    );
    Some(mapped)
}

/// Solr ships each hierarchy as one `$`-joined string of `Rank:Name`
/// segments. Normalized output is one ordered dict per hierarchy, with
/// every canonical rank present.
fn parse_hierarchies(value: Option<&Value>) -> Vec<Map<String, Value>> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut hierarchies = Vec::new();
    for entry in entries.iter().filter_map(Value::as_str) {
        let mut by_rank = Map::new();
        for segment in entry.split('$') {
            if let Some((rank, name)) = segment.split_once(':') {
                by_rank.insert(rank.to_ascii_lowercase(), json!(name));
            }
        }
        let mut hierarchy = Map::new();
        for rank in RANKS {
            hierarchy.insert(
                rank.to_owned(),
                by_rank.get(rank).cloned().unwrap_or(Value::Null),
            );
        }
        hierarchies.push(hierarchy);
    }
    hierarchies
}

/// Synonym strings are `$`-joined groups mixing names with `rank:tsn`
/// markers; only the bare names survive normalization.
fn parse_synonyms(value: Option<&Value>) -> Vec<Vec<String>> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_str)
        .map(|entry| {
            entry
                .split('$')
                .filter(|name| !name.is_empty() && !name.contains(':'))
                .map(str::to_owned)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn record_parses_hierarchy_and_urls() {
        let doc = obj(json!({
            "tsn": "41107",
            "nameWTaxonAuthor": "Poa annua L.",
            "nameWOInd": "Poa annua",
            "usage": "accepted",
            "credibilityRating": "TWG standards met",
            "hierarchySoFarWRanks": [
                "Kingdom:Plantae$Division:Tracheophyta$Class:Magnoliopsida$Order:Poales$Family:Poaceae$Genus:Poa$Species:Poa annua"
            ],
            "synonyms": ["$Poa aestivalis$41108:$Poa annua var. aquatica$"],
        }));
        let rec = standardize_record(&doc, false).expect("record");

        assert_eq!(rec["s2n:scientific_name"], json!("Poa annua L."));
        assert_eq!(rec["s2n:itis_tsn"], json!("41107"));
        assert_eq!(
            rec[VIEW_URL_KEY],
            json!("https://www.itis.gov/servlet/SingleRpt/SingleRpt?search_topic=TSN&search_value=41107")
        );

        let hierarchy = &rec["s2n:hierarchy"].as_array().expect("list")[0];
        assert_eq!(hierarchy["kingdom"], json!("Plantae"));
        assert_eq!(hierarchy["family"], json!("Poaceae"));
        // Solr calls the plant phylum a Division, which is not a canonical rank.
        assert_eq!(hierarchy["phylum"], Value::Null);

        assert_eq!(
            rec["s2n:synonyms"],
            json!([["Poa aestivalis", "Poa annua var. aquatica"]])
        );
    }

    #[test]
    fn accepted_filter_drops_not_accepted_usage() {
        let doc = obj(json!({"tsn": "1", "usage": "not accepted"}));
        assert!(standardize_record(&doc, true).is_none());
        assert!(standardize_record(&doc, false).is_some());
    }

    #[test]
    fn solr_query_escaping_uses_backslash_sequences() {
        let q = format!("nameWInd:{}", "Poa annua");
        let encoded = encode_filters(
            &[("q", FilterValue::from(q)), ("wt", FilterValue::from("json"))],
            UrlEscape::SolrManual,
        );
        assert_eq!(encoded, "q=nameWInd:Poa\\%20annua&wt=json");
    }
}
