use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ServiceType;

/// Community schema a canonical field originates from. The namespace code
/// prefixes the field name on the wire: `dwc:scientificName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Dwc,
    Gbif,
    Dcterms,
    Idigbio,
    Mopho,
    S2n,
}

impl Namespace {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dwc => "dwc",
            Self::Gbif => "gbif",
            Self::Dcterms => "dcterms",
            Self::Idigbio => "idigbio",
            Self::Mopho => "mopho",
            Self::S2n => "s2n",
        }
    }

    /// Term definition URL, used by the Specify portal map which qualifies
    /// native keys with the full namespace URL.
    pub const fn url(self) -> &'static str {
        match self {
            Self::Dwc => "http://rs.tdwg.org/dwc/terms",
            Self::Gbif => {
                "https://gbif.github.io/dwc-api/apidocs/org/gbif/dwc/terms/GbifTerm.html"
            }
            Self::Dcterms => "http://purl.org/dc/terms",
            Self::Idigbio | Self::S2n => "",
            Self::Mopho => "https://www.morphosource.org/About/API",
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container kind of a canonical field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
    Dict,
}

/// One canonical field of a service schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalField {
    pub name: &'static str,
    pub namespace: Namespace,
    pub kind: FieldKind,
}

impl CanonicalField {
    const fn scalar(name: &'static str, namespace: Namespace) -> Self {
        Self {
            name,
            namespace,
            kind: FieldKind::Scalar,
        }
    }

    const fn list(name: &'static str, namespace: Namespace) -> Self {
        Self {
            name,
            namespace,
            kind: FieldKind::List,
        }
    }

    const fn dict(name: &'static str, namespace: Namespace) -> Self {
        Self {
            name,
            namespace,
            kind: FieldKind::Dict,
        }
    }

    pub fn wire_key(&self) -> String {
        format!("{}:{}", self.namespace.as_str(), self.name)
    }
}

/// Taxonomic rank ordering used when normalizing provider hierarchies.
pub const RANKS: [&str; 7] = [
    "kingdom", "phylum", "class", "order", "family", "genus", "species",
];

pub const VIEW_URL_KEY: &str = "s2n:view_url";
pub const API_URL_KEY: &str = "s2n:api_url";
pub const GBIF_TAXON_KEY: &str = "s2n:gbif_taxon_key";
pub const GBIF_OCC_COUNT_KEY: &str = "s2n:gbif_occurrence_count";
pub const GBIF_OCC_URL_KEY: &str = "s2n:gbif_occurrence_url";

const NAME_FIELDS: &[CanonicalField] = &[
    CanonicalField::scalar("view_url", Namespace::S2n),
    CanonicalField::scalar("api_url", Namespace::S2n),
    CanonicalField::scalar("status", Namespace::S2n),
    CanonicalField::scalar("scientific_name", Namespace::S2n),
    CanonicalField::scalar("canonical_name", Namespace::S2n),
    CanonicalField::scalar("common_names", Namespace::S2n),
    CanonicalField::scalar("kingdom", Namespace::S2n),
    CanonicalField::scalar("rank", Namespace::S2n),
    CanonicalField::list("synonyms", Namespace::S2n),
    CanonicalField::list("hierarchy", Namespace::S2n),
    CanonicalField::scalar("gbif_occurrence_count", Namespace::S2n),
    CanonicalField::scalar("gbif_occurrence_url", Namespace::S2n),
    CanonicalField::scalar("gbif_confidence", Namespace::S2n),
    CanonicalField::scalar("gbif_taxon_key", Namespace::S2n),
    CanonicalField::scalar("itis_tsn", Namespace::S2n),
    CanonicalField::scalar("itis_credibility", Namespace::S2n),
    CanonicalField::scalar("worms_valid_AphiaID", Namespace::S2n),
    CanonicalField::scalar("worms_lsid", Namespace::S2n),
    CanonicalField::scalar("worms_isMarine", Namespace::S2n),
    CanonicalField::scalar("worms_isBrackish", Namespace::S2n),
    CanonicalField::scalar("worms_isFreshwater", Namespace::S2n),
    CanonicalField::scalar("worms_isTerrestrial", Namespace::S2n),
    CanonicalField::scalar("worms_isExtinct", Namespace::S2n),
    CanonicalField::scalar("worms_match_type", Namespace::S2n),
];

const OCCURRENCE_FIELDS: &[CanonicalField] = &[
    CanonicalField::scalar("view_url", Namespace::S2n),
    CanonicalField::scalar("api_url", Namespace::S2n),
    CanonicalField::scalar("scientificName", Namespace::Dwc),
    CanonicalField::scalar("taxonRank", Namespace::Dwc),
    CanonicalField::scalar("kingdom", Namespace::Dwc),
    CanonicalField::scalar("phylum", Namespace::Dwc),
    CanonicalField::scalar("class", Namespace::Dwc),
    CanonicalField::scalar("order", Namespace::Dwc),
    CanonicalField::scalar("family", Namespace::Dwc),
    CanonicalField::scalar("genus", Namespace::Dwc),
    CanonicalField::scalar("specificEpithet", Namespace::Dwc),
    CanonicalField::scalar("scientificNameAuthorship", Namespace::Dwc),
    CanonicalField::scalar("catalogNumber", Namespace::Dwc),
    CanonicalField::scalar("collectionCode", Namespace::Dwc),
    CanonicalField::scalar("institutionCode", Namespace::Dwc),
    CanonicalField::scalar("otherCatalogNumbers", Namespace::Dwc),
    CanonicalField::scalar("datasetName", Namespace::Dwc),
    CanonicalField::scalar("year", Namespace::Dwc),
    CanonicalField::scalar("month", Namespace::Dwc),
    CanonicalField::scalar("day", Namespace::Dwc),
    CanonicalField::scalar("recordedBy", Namespace::Dwc),
    CanonicalField::scalar("fieldNumber", Namespace::Dwc),
    CanonicalField::scalar("locality", Namespace::Dwc),
    CanonicalField::scalar("county", Namespace::Dwc),
    CanonicalField::scalar("stateProvince", Namespace::Dwc),
    CanonicalField::scalar("country", Namespace::Dwc),
    CanonicalField::scalar("countryCode", Namespace::Dwc),
    CanonicalField::scalar("decimalLongitude", Namespace::Dwc),
    CanonicalField::scalar("decimalLatitude", Namespace::Dwc),
    CanonicalField::scalar("geodeticDatum", Namespace::Dwc),
    CanonicalField::scalar("basisOfRecord", Namespace::Dwc),
    CanonicalField::scalar("preparations", Namespace::Dwc),
    CanonicalField::list("associatedReferences", Namespace::Dwc),
    CanonicalField::list("associatedSequences", Namespace::Dwc),
    CanonicalField::dict("issues", Namespace::S2n),
    CanonicalField::scalar("accessRights", Namespace::Dcterms),
    CanonicalField::scalar("language", Namespace::Dcterms),
    CanonicalField::scalar("license", Namespace::Dcterms),
    CanonicalField::scalar("modified", Namespace::Dcterms),
    CanonicalField::scalar("type", Namespace::Dcterms),
    CanonicalField::scalar("gbifID", Namespace::Gbif),
    CanonicalField::scalar("publishingOrgKey", Namespace::Gbif),
    CanonicalField::scalar("datasetKey", Namespace::Gbif),
    CanonicalField::scalar("acceptedScientificName", Namespace::Gbif),
    CanonicalField::scalar("uuid", Namespace::Idigbio),
    CanonicalField::scalar("specimen.specimen_id", Namespace::Mopho),
    CanonicalField::scalar("specify_identifier", Namespace::S2n),
];

const MAP_FIELDS: &[CanonicalField] = &[
    CanonicalField::scalar("view_url", Namespace::S2n),
    CanonicalField::scalar("api_url", Namespace::S2n),
    CanonicalField::scalar("endpoint", Namespace::S2n),
    CanonicalField::scalar("data_link", Namespace::S2n),
    CanonicalField::scalar("layer_type", Namespace::S2n),
    CanonicalField::scalar("layer_name", Namespace::S2n),
    CanonicalField::scalar("point_count", Namespace::S2n),
    CanonicalField::list("point_bbox", Namespace::S2n),
    CanonicalField::scalar("species_name", Namespace::S2n),
    CanonicalField::scalar("sdm_projection_scenario_code", Namespace::S2n),
    CanonicalField::scalar("sdm_projection_scenario_link", Namespace::S2n),
    CanonicalField::scalar("status", Namespace::S2n),
    CanonicalField::scalar("modtime", Namespace::S2n),
    CanonicalField::dict("vendor_specific_parameters", Namespace::S2n),
];

const RESOLVE_FIELDS: &[CanonicalField] = &[
    CanonicalField::scalar("ident", Namespace::S2n),
    CanonicalField::scalar("dataset_guid", Namespace::S2n),
    CanonicalField::scalar("institutionCode", Namespace::Dwc),
    CanonicalField::scalar("basisOfRecord", Namespace::Dwc),
    CanonicalField::scalar("date", Namespace::S2n),
    CanonicalField::scalar("ark", Namespace::S2n),
    CanonicalField::scalar("api_url", Namespace::S2n),
];

/// Canonical field catalogue per logical service.
///
/// The catalogue is the single source of record shape: orchestrators format
/// output against it and adapters build field maps from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRegistry;

impl SchemaRegistry {
    pub fn fields(service: ServiceType) -> &'static [CanonicalField] {
        match service {
            ServiceType::Name => NAME_FIELDS,
            ServiceType::Occurrence => OCCURRENCE_FIELDS,
            ServiceType::Map => MAP_FIELDS,
            ServiceType::Resolve => RESOLVE_FIELDS,
            ServiceType::Badge => &[],
        }
    }

    /// Ordered wire keys (`namespace:field`) for a service.
    pub fn wire_keys(service: ServiceType) -> Vec<String> {
        Self::fields(service)
            .iter()
            .map(CanonicalField::wire_key)
            .collect()
    }

    pub fn field_kind(service: ServiceType, wire_key: &str) -> FieldKind {
        Self::fields(service)
            .iter()
            .find(|field| field.wire_key() == wire_key)
            .map_or(FieldKind::Scalar, |field| field.kind)
    }

    /// Rewrite every record to hold each canonical field exactly once, in
    /// registry order. Absent list/dict fields materialize as `[]`/`{}`,
    /// other absent fields as `null`. Records with no content are dropped.
    /// Idempotent by construction.
    pub fn format_records(service: ServiceType, records: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
        let fields = Self::fields(service);
        let mut formatted = Vec::with_capacity(records.len());
        for record in records {
            if record.is_empty() {
                continue;
            }
            let mut ordered = Map::with_capacity(fields.len());
            for field in fields {
                let key = field.wire_key();
                let value = match record.get(&key) {
                    Some(value) if !value.is_null() => value.clone(),
                    _ => match field.kind {
                        FieldKind::List => Value::Array(Vec::new()),
                        FieldKind::Dict => Value::Object(Map::new()),
                        FieldKind::Scalar => Value::Null,
                    },
                };
                ordered.insert(key, value);
            }
            if !ordered.is_empty() {
                formatted.push(ordered);
            }
        }
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_keys_are_namespaced_and_ordered() {
        let keys = SchemaRegistry::wire_keys(ServiceType::Occurrence);
        assert_eq!(keys[0], "s2n:view_url");
        assert_eq!(keys[2], "dwc:scientificName");
        assert!(keys.contains(&String::from("gbif:gbifID")));
        assert!(keys.contains(&String::from("s2n:issues")));
    }

    #[test]
    fn name_schema_carries_occurrence_count_fields() {
        let keys = SchemaRegistry::wire_keys(ServiceType::Name);
        assert!(keys.contains(&String::from(GBIF_OCC_COUNT_KEY)));
        assert!(keys.contains(&String::from(GBIF_OCC_URL_KEY)));
    }

    #[test]
    fn format_records_materializes_collections() {
        let mut record = Map::new();
        record.insert(
            String::from("s2n:scientific_name"),
            json!("Poa annua L."),
        );
        let formatted = SchemaRegistry::format_records(ServiceType::Name, vec![record]);

        assert_eq!(formatted.len(), 1);
        let only = &formatted[0];
        assert_eq!(only["s2n:scientific_name"], json!("Poa annua L."));
        assert_eq!(only["s2n:synonyms"], json!([]));
        assert_eq!(only["s2n:hierarchy"], json!([]));
        assert_eq!(only["s2n:status"], Value::Null);
        assert_eq!(only.len(), NAME_FIELDS.len());
    }

    #[test]
    fn format_records_is_idempotent() {
        let mut record = Map::new();
        record.insert(String::from("dwc:scientificName"), json!("Poa annua"));
        record.insert(String::from("s2n:issues"), json!({"TAXON_MATCH_FUZZY": "x"}));

        let once = SchemaRegistry::format_records(ServiceType::Occurrence, vec![record]);
        let twice = SchemaRegistry::format_records(ServiceType::Occurrence, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn format_records_drops_empty_records() {
        let formatted =
            SchemaRegistry::format_records(ServiceType::Name, vec![Map::new(), Map::new()]);
        assert!(formatted.is_empty());
    }

    #[test]
    fn ranks_are_kingdom_to_species() {
        assert_eq!(RANKS[0], "kingdom");
        assert_eq!(RANKS[6], "species");
    }
}
