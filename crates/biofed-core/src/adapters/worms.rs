use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, WORMS_NAME_MAP};
use crate::http::QueryExecutor;
use crate::params::NameRequest;
use crate::policy::ProviderPolicy;
use crate::schema::{API_URL_KEY, RANKS};
use crate::{ProviderId, ServiceType};

const REST_URL: &str = "http://www.marinespecies.org/rest";
pub const RECORD_FORMAT: &str = "https://www.marinespecies.org/rest/";

/// WoRMS Aphia name-match adapter.
///
/// The match service answers a list of record lists, one inner list per
/// requested name. Every record counts toward the total; the accepted
/// flag only changes how the scientific name falls back when the record
/// has no valid name.
pub struct WormsAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl WormsAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Worms),
        }
    }

    async fn run_match(&self, request: &NameRequest) -> ProviderResult {
        let name_clean = request.namestr.trim();
        let url = format!(
            "{REST_URL}/AphiaRecordsByMatchNames?scientificnames[]={}&marine_only=true",
            urlencoding::encode(name_clean)
        );

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Name, ProviderId::Worms, error),
        };
        let (value, status, url) = match expect_json(ServiceType::Name, ProviderId::Worms, result) {
            Ok(parts) => parts,
            Err(failure) => return failure,
        };

        let mut errors = ErrInfo::new();
        let mut total = 0;
        let mut records = Vec::new();
        match value.as_array() {
            Some(concept_lists) => {
                for concept in concept_lists {
                    let Some(recs) = concept.as_array() else {
                        continue;
                    };
                    for rec in recs {
                        if let Value::Object(rec) = rec {
                            total += 1;
                            records.push(standardize_record(rec, request.is_accepted));
                        }
                    }
                }
            }
            None => errors.push_error("unexpected match response shape".to_owned()),
        }

        ProviderResult::counted(
            ServiceType::Name,
            ProviderMeta::new(ProviderId::Worms, Some(status), vec![url]),
            RECORD_FORMAT,
            total,
            records,
            errors,
        )
    }
}

impl ProviderAdapter for WormsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Worms
    }

    fn service(&self) -> ServiceType {
        ServiceType::Name
    }

    fn match_name<'a>(&'a self, request: &'a NameRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_match(request))
    }
}

fn standardize_record(rec: &Map<String, Value>, accepted_only: bool) -> Map<String, Value> {
    let canonical = match rec.get("valid_name").and_then(Value::as_str) {
        Some(valid_name) => valid_name.to_owned(),
        None if !accepted_only => rec
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        None => String::new(),
    };
    let scientific = match rec.get("authority").and_then(Value::as_str) {
        Some(authority) => format!("{canonical} {authority}"),
        None => canonical.clone(),
    };

    let mut mapped = apply_field_map(&WORMS_NAME_MAP, rec);
    mapped.insert("s2n:scientific_name".to_owned(), json!(scientific));
    mapped.insert("s2n:canonical_name".to_owned(), json!(canonical));
    if let Some(aphia_id) = rec.get("valid_AphiaID").and_then(scalar_string) {
        mapped.insert(
            API_URL_KEY.to_owned(),
            json!(format!("{REST_URL}/AphiaNameByAphiaID/{aphia_id}")),
        );
    }
    let mut hierarchy = Map::new();
    for rank in RANKS {
        if let Some(value) = rec.get(rank) {
            hierarchy.insert(rank.to_owned(), value.clone());
        }
    }
    mapped.insert("s2n:hierarchy".to_owned(), json!([hierarchy]));
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn record_assembles_scientific_name_and_data_url() {
        let rec = obj(json!({
            "valid_name": "Gadus morhua",
            "authority": "Linnaeus, 1758",
            "valid_AphiaID": 126436,
            "url": "https://www.marinespecies.org/aphia.php?p=taxdetails&id=126436",
            "lsid": "urn:lsid:marinespecies.org:taxname:126436",
            "status": "accepted",
            "isMarine": 1,
            "kingdom": "Animalia",
            "genus": "Gadus",
        }));
        let std = standardize_record(&rec, false);

        assert_eq!(std["s2n:scientific_name"], json!("Gadus morhua Linnaeus, 1758"));
        assert_eq!(std["s2n:canonical_name"], json!("Gadus morhua"));
        assert_eq!(
            std[API_URL_KEY],
            json!("http://www.marinespecies.org/rest/AphiaNameByAphiaID/126436")
        );
        assert_eq!(
            std["s2n:view_url"],
            json!("https://www.marinespecies.org/aphia.php?p=taxdetails&id=126436")
        );
        assert_eq!(std["s2n:worms_isMarine"], json!(1));
        let hierarchy = &std["s2n:hierarchy"].as_array().expect("list")[0];
        assert_eq!(hierarchy["kingdom"], json!("Animalia"));
    }

    #[test]
    fn unmatched_name_falls_back_only_when_not_accepted_only() {
        let rec = obj(json!({"name": "Gadus morrhua"}));

        let lenient = standardize_record(&rec, false);
        assert_eq!(lenient["s2n:canonical_name"], json!("Gadus morrhua"));

        let strict = standardize_record(&rec, true);
        assert_eq!(strict["s2n:canonical_name"], json!(""));
    }
}
