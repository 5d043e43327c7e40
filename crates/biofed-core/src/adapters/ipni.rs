use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, IPNI_NAME_MAP};
use crate::http::{encode_filters, FilterValue, QueryExecutor, UrlEscape};
use crate::params::NameRequest;
use crate::policy::ProviderPolicy;
use crate::schema::{API_URL_KEY, RANKS, VIEW_URL_KEY};
use crate::{ProviderId, ServiceType};

const API_BASE: &str = "http://beta.ipni.org/api/1";
const VIEW_BASE: &str = "https://www.ipni.org";
pub const RECORD_FORMAT: &str = "http://beta.ipni.org/api/1";

/// IPNI nomenclatural index adapter.
///
/// IPNI records carry citations rather than taxonomic concepts, so the
/// accepted-only flag is a no-op here.
pub struct IpniAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl IpniAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Ipni),
        }
    }

    async fn run_match(&self, request: &NameRequest) -> ProviderResult {
        let (genus, species) = split_binomial(&request.namestr);
        if genus.is_empty() {
            let mut errors = ErrInfo::new();
            errors.push_error(format!("no genus in name '{}'", request.namestr));
            return ProviderResult::failure(
                ServiceType::Name,
                ProviderId::Ipni,
                Some(400),
                errors,
            );
        }
        let q = if species.is_empty() {
            format!("genus:{genus}")
        } else {
            format!("genus:{genus},species:{species}")
        };
        let filters = encode_filters(&[("q", FilterValue::from(q))], UrlEscape::Standard);
        let url = format!("{API_BASE}/search?{filters}");

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Name, ProviderId::Ipni, error),
        };
        let (value, status, url) = match expect_json(ServiceType::Name, ProviderId::Ipni, result) {
            Ok(parts) => parts,
            Err(failure) => return failure,
        };

        let mut errors = ErrInfo::new();
        let total = value
            .get("totalResults")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| {
                errors.push_error("missing totalResults element".to_owned());
                0
            });
        let mut records = Vec::new();
        if let Some(results) = value.get("results").and_then(Value::as_array) {
            for rec in results {
                if let Value::Object(rec) = rec {
                    records.push(standardize_record(rec));
                }
            }
        }

        ProviderResult::counted(
            ServiceType::Name,
            ProviderMeta::new(ProviderId::Ipni, Some(status), vec![url]),
            RECORD_FORMAT,
            total as usize,
            records,
            errors,
        )
    }
}

impl ProviderAdapter for IpniAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Ipni
    }

    fn service(&self) -> ServiceType {
        ServiceType::Name
    }

    fn match_name<'a>(&'a self, request: &'a NameRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_match(request))
    }
}

/// First two whitespace tokens of a name string, genus then epithet.
fn split_binomial(namestr: &str) -> (&str, &str) {
    let mut parts = namestr.split_whitespace();
    let genus = parts.next().unwrap_or_default();
    let species = parts
        .next()
        .filter(|epithet| {
            let Some(first) = epithet.chars().next() else {
                return false;
            };
            !first.is_uppercase() && first != '('
        })
        .unwrap_or_default();
    (genus, species)
}

fn standardize_record(rec: &Map<String, Value>) -> Map<String, Value> {
    let canonical = rec
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let scientific = match rec.get("authors").and_then(Value::as_str) {
        Some(authors) => format!("{canonical} {authors}"),
        None => canonical.clone(),
    };

    let mut mapped = apply_field_map(&IPNI_NAME_MAP, rec);
    mapped.insert("s2n:scientific_name".to_owned(), json!(scientific));
    mapped.insert("s2n:canonical_name".to_owned(), json!(canonical));
    if let Some(rank) = rec.get("rank") {
        mapped.insert("s2n:rank".to_owned(), rank.clone());
    }
    if let Some(path) = rec.get("url").and_then(Value::as_str) {
        mapped.insert(VIEW_URL_KEY.to_owned(), json!(format!("{VIEW_BASE}{path}")));
    }
    if let Some(id) = rec.get("id").and_then(scalar_string) {
        mapped.insert(API_URL_KEY.to_owned(), json!(format!("{API_BASE}/n/{id}")));
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

    #[test]
    fn binomial_split_stops_at_author_tokens() {
        assert_eq!(split_binomial("Poa annua L."), ("Poa", "annua"));
        assert_eq!(split_binomial("Poa (Arctopoa) annua"), ("Poa", ""));
        assert_eq!(split_binomial("Poa"), ("Poa", ""));
        assert_eq!(split_binomial(""), ("", ""));
    }

    #[test]
    fn record_carries_citation_urls_and_hierarchy() {
        let rec = json!({
            "name": "Poa annua",
            "authors": "L.",
            "rank": "spec.",
            "url": "/n/320035-2",
            "id": "320035-2",
            "family": "Poaceae",
            "genus": "Poa",
            "species": "annua",
        });
        let std = standardize_record(rec.as_object().expect("object"));

        assert_eq!(std["s2n:scientific_name"], json!("Poa annua L."));
        assert_eq!(std["s2n:canonical_name"], json!("Poa annua"));
        assert_eq!(std["s2n:rank"], json!("spec."));
        assert_eq!(std[VIEW_URL_KEY], json!("https://www.ipni.org/n/320035-2"));
        assert_eq!(
            std[API_URL_KEY],
            json!("http://beta.ipni.org/api/1/n/320035-2")
        );
        let hierarchy = &std["s2n:hierarchy"].as_array().expect("list")[0];
        assert_eq!(hierarchy["family"], json!("Poaceae"));
        assert_eq!(hierarchy["species"], json!("annua"));
    }
}
