use serde_json::{json, Map, Value};

use crate::adapter::{AdapterFuture, ProviderAdapter};
use crate::adapters::support::{expect_json, query_failure};
use crate::envelope::{ErrInfo, ProviderMeta, ProviderResult};
use crate::fieldmap::{apply_field_map, LIFEMAPPER_MAP_MAP};
use crate::http::{encode_filters, FilterValue, QueryExecutor, UrlEscape};
use crate::params::MapRequest;
use crate::policy::ProviderPolicy;
use crate::{ProviderId, ServiceType};

const REST_URL: &str = "https://data.lifemapper.org/api/v2";
const PROJ_RESOURCE: &str = "sdmproject";
pub const RECORD_FORMAT: &str = "lifemapper_layer schema TBD";

/// Projection status value marking a finished SDM computation.
const COMPLETE_STATUS: i64 = 300;

/// Lifemapper species-distribution map adapter.
///
/// The projection listing answers one record per modeled scenario; the
/// occurrence-point layer referenced by the first projection leads the
/// record list so a caller always gets the point map even when every
/// projection is filtered out by scenario code.
pub struct LifemapperAdapter {
    executor: QueryExecutor,
    policy: ProviderPolicy,
}

impl LifemapperAdapter {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            policy: ProviderPolicy::default_for(ProviderId::Lifemapper),
        }
    }

    async fn run_map_layers(&self, request: &MapRequest, namestr: &str) -> ProviderResult {
        let filters = encode_filters(
            &[
                ("displayname", FilterValue::from(namestr)),
                ("atom", FilterValue::from(0)),
            ],
            UrlEscape::Standard,
        );
        let url = format!("{REST_URL}/{PROJ_RESOURCE}?{filters}");

        let result = match self.executor.get(&url, self.policy.timeout_ms()).await {
            Ok(result) => result,
            Err(error) => return query_failure(ServiceType::Map, ProviderId::Lifemapper, error),
        };
        let (value, status, url) =
            match expect_json(ServiceType::Map, ProviderId::Lifemapper, result) {
                Ok(parts) => parts,
                Err(failure) => return failure,
            };

        let mut errors = ErrInfo::new();
        let projections = value.as_array().cloned().unwrap_or_default();

        let mut records = Vec::new();
        if !projections.is_empty() {
            match occurrence_set_url(&projections[0]) {
                Some(occ_url) => {
                    if let Some(occ_layer) = self.fetch_occurrence_layer(&occ_url).await {
                        records.push(occ_layer);
                        for projection in &projections {
                            if let Value::Object(rec) = projection {
                                if let Some(layer) = standardize_layer_record(
                                    rec,
                                    &request.scenariocodes,
                                    request.color.as_deref(),
                                ) {
                                    records.push(layer);
                                }
                            }
                        }
                    }
                }
                None => errors.push_error("failed to return occurrence URL".to_owned()),
            }
        }

        ProviderResult::new(
            ServiceType::Map,
            ProviderMeta::new(ProviderId::Lifemapper, Some(status), vec![url]),
            RECORD_FORMAT,
            records,
            errors,
        )
    }

    async fn fetch_occurrence_layer(&self, occ_url: &str) -> Option<Map<String, Value>> {
        let result = self
            .executor
            .get(occ_url, self.policy.timeout_ms())
            .await
            .ok()?;
        let rec = result.payload.as_json()?.as_object()?;
        standardize_layer_record(rec, &[], None)
    }
}

impl ProviderAdapter for LifemapperAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Lifemapper
    }

    fn service(&self) -> ServiceType {
        ServiceType::Map
    }

    fn map_layers<'a>(&'a self, request: &'a MapRequest, namestr: &'a str) -> AdapterFuture<'a> {
        Box::pin(self.run_map_layers(request, namestr))
    }
}

fn occurrence_set_url(projection: &Value) -> Option<String> {
    projection
        .get("occurrence_set")?
        .get("metadata_url")?
        .as_str()
        .map(str::to_owned)
}

/// Reduce one projection or occurrence-set record to a map layer.
/// Incomplete computations, records without a published map, and
/// projections outside the requested scenario codes yield `None`.
fn standardize_layer_record(
    rec: &Map<String, Value>,
    scenariocodes: &[String],
    color: Option<&str>,
) -> Option<Map<String, Value>> {
    let status = rec.get("status").and_then(Value::as_i64)?;
    if status != COMPLETE_STATUS {
        return None;
    }
    let map_elt = rec.get("map").and_then(Value::as_object)?;
    let map_name = map_elt.get("map_name").and_then(Value::as_str)?;
    let map_url = map_elt.get("endpoint").and_then(Value::as_str)?;
    let layer_name = map_elt.get("layer_name").and_then(Value::as_str)?;
    let endpoint = format!("{map_url}/{map_name}");

    let scenario = rec.get("projection_scenario").and_then(Value::as_object);
    let scen_code = scenario
        .and_then(|scenario| scenario.get("code"))
        .and_then(Value::as_str);
    let scen_link = scenario
        .and_then(|scenario| scenario.get("metadata_url"))
        .and_then(Value::as_str);
    if let Some(code) = scen_code {
        if !scenariocodes.is_empty() && !scenariocodes.iter().any(|wanted| wanted == code) {
            return None;
        }
    }

    let (layer_elt, layer_type) = match rec.get("spatial_raster").and_then(Value::as_object) {
        Some(raster) => (Some(raster), Some("raster")),
        None => match rec.get("spatial_vector").and_then(Value::as_object) {
            Some(vector) => (Some(vector), Some("vector")),
            None => (None, None),
        },
    };
    let data_link = layer_elt.and_then(|elt| elt.get("data_url")).cloned();
    let (point_count, point_bbox) = match (layer_type, layer_elt) {
        (Some("vector"), Some(elt)) => {
            (elt.get("num_features").cloned(), elt.get("bbox").cloned())
        }
        _ => (None, None),
    };

    let mut mapped = apply_field_map(&LIFEMAPPER_MAP_MAP, rec);
    mapped.insert("s2n:endpoint".to_owned(), json!(endpoint));
    mapped.insert("s2n:layer_name".to_owned(), json!(layer_name));
    if let Some(layer_type) = layer_type {
        mapped.insert("s2n:layer_type".to_owned(), json!(layer_type));
    }
    if let Some(data_link) = data_link {
        mapped.insert("s2n:data_link".to_owned(), data_link);
    }
    if let Some(point_count) = point_count {
        mapped.insert("s2n:point_count".to_owned(), point_count);
    }
    if let Some(point_bbox) = point_bbox {
        mapped.insert("s2n:point_bbox".to_owned(), point_bbox);
    }
    if let Some(code) = scen_code {
        mapped.insert("s2n:sdm_projection_scenario_code".to_owned(), json!(code));
    }
    if let Some(link) = scen_link {
        mapped.insert("s2n:sdm_projection_scenario_link".to_owned(), json!(link));
    }
    if let Some(color) = color {
        mapped.insert(
            "s2n:vendor_specific_parameters".to_owned(),
            json!({ "color": color }),
        );
    }
    Some(mapped)
}
