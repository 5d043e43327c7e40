use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure, scalar_string};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, MORPHOSOURCE_OCCURRENCE_MAP};
use crate::http::QueryExecutor;
use crate::params::OccRequest;
use crate::policy::ProviderPolicy;
use crate::schema::{API_URL_KEY, VIEW_URL_KEY};
use crate::{ProviderId, ServiceType};

const REST_URL: &str = "https://ms1.morphosource.org/api/v1";
const VIEW_URL: &str = "https://www.morphosource.org/concern/biological_specimens";
pub const RECORD_FORMAT: &str = "https://www.morphosource.org/About/API";
const PAGE_LIMIT: u32 = 1000;

/// MorphoSource specimen-media adapter. Only the first result page is
/// fetched; the reported total still reflects the provider count.
pub struct MorphosourceAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl MorphosourceAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Morphosource),
        }
    }

    async fn run_occurrences(&self, request: &OccRequest) -> ProviderResult {
        let Some(occid) = request.occid.as_deref() else {
            let mut errors = ErrInfo::new();
            errors.push_error("no occurrence identifier given".to_owned());
            return ProviderResult::failure(
                ServiceType::Occurrence,
                ProviderId::Morphosource,
                Some(400),
                errors,
            );
        };
        let url = occurrence_data_url(occid);

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => {
                return query_failure(ServiceType::Occurrence, ProviderId::Morphosource, error)
            }
        };
        let (value, status, url) =
            match expect_json(ServiceType::Occurrence, ProviderId::Morphosource, result) {
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
        if !request.count_only {
            if let Some(results) = value.get("results").and_then(Value::as_array) {
                for rec in results {
                    if let Value::Object(rec) = rec {
                        records.push(standardize_record(rec));
                    }
                }
            }
        }

        ProviderResult::counted(
            ServiceType::Occurrence,
            ProviderMeta::new(ProviderId::Morphosource, Some(status), vec![url]),
            RECORD_FORMAT,
            total as usize,
            records,
            errors,
        )
    }
}

impl ProviderAdapter for MorphosourceAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Morphosource
    }

    fn service(&self) -> ServiceType {
        ServiceType::Occurrence
    }

    fn occurrences<'a>(&'a self, request: &'a OccRequest) -> AdapterFuture<'a> {
        Box::pin(self.run_occurrences(request))
    }
}

fn occurrence_data_url(occid: &str) -> String {
    format!(
        "{REST_URL}/find/specimens?start=0&limit={PAGE_LIMIT}&q=occurrence_id%3A{}",
        urlencoding::encode(occid)
    )
}

/// Specimen pages are addressed by the local id as `S{id}` left-padded
/// with zeros to nine characters.
fn occurrence_view_url(specimen_id: &str) -> String {
    let idtail = format!("S{specimen_id}");
    format!("{VIEW_URL}/{idtail:0>9}")
}

fn standardize_record(rec: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = apply_field_map(&MORPHOSOURCE_OCCURRENCE_MAP, rec);
    if let Some(occid) = rec.get("specimen.occurrence_id").and_then(scalar_string) {
        mapped.insert(API_URL_KEY.to_owned(), json!(occurrence_data_url(&occid)));
    }
    if let Some(specimen_id) = rec.get("specimen.specimen_id").and_then(scalar_string) {
        mapped.insert(
            VIEW_URL_KEY.to_owned(),
            json!(occurrence_view_url(&specimen_id)),
        );
    }
    mapped
}
