//! Declarative canonical-to-provider field maps.
//!
//! Each provider ships records under its own key names; a [`FieldMap`]
//! describes, per canonical field, which provider key carries the value.
//! [`apply_field_map`] walks the canonical schema in order so mapped
//! records keep a deterministic key sequence.

use serde_json::{Map, Value};

use crate::schema::{CanonicalField, SchemaRegistry};
use crate::ServiceType;

/// How a provider names the key for a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    /// The bare canonical field name, e.g. `scientificName`.
    Name,
    /// The namespaced wire key, e.g. `dwc:scientificName`.
    WireKey,
    /// The namespace URL joined with the field name, e.g.
    /// `http://rs.tdwg.org/dwc/terms/scientificName`.
    NamespaceUrl,
}

/// Field map for one provider and service.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    service: ServiceType,
    default_style: KeyStyle,
    /// Canonical field name to provider key, overriding the default style.
    renames: &'static [(&'static str, &'static str)],
    /// When set, canonical fields outside this list (and outside `renames`)
    /// are not mapped at all.
    only: Option<&'static [&'static str]>,
}

impl FieldMap {
    pub const fn new(service: ServiceType, default_style: KeyStyle) -> Self {
        Self {
            service,
            default_style,
            renames: &[],
            only: None,
        }
    }

    pub const fn with_renames(mut self, renames: &'static [(&'static str, &'static str)]) -> Self {
        self.renames = renames;
        self
    }

    pub const fn with_only(mut self, only: &'static [&'static str]) -> Self {
        self.only = Some(only);
        self
    }

    pub fn service(&self) -> ServiceType {
        self.service
    }

    /// Provider key carrying the given canonical field, or `None` when the
    /// provider does not ship it.
    pub fn provider_key(&self, field: &CanonicalField) -> Option<String> {
        if let Some((_, provider_key)) = self.renames.iter().find(|(name, _)| *name == field.name) {
            return Some((*provider_key).to_owned());
        }
        if let Some(only) = self.only {
            if !only.iter().any(|name| *name == field.name) {
                return None;
            }
        }
        let key = match self.default_style {
            KeyStyle::Name => field.name.to_owned(),
            KeyStyle::WireKey => field.wire_key(),
            KeyStyle::NamespaceUrl => format!("{}/{}", field.namespace.url(), field.name),
        };
        Some(key)
    }
}

/// GBIF species-match responses use GBIF's own key names for a handful of
/// fields and the canonical names for the rest.
pub const GBIF_NAME_MAP: FieldMap = FieldMap::new(ServiceType::Name, KeyStyle::Name).with_renames(&[
    ("scientific_name", "scientificName"),
    ("canonical_name", "canonicalName"),
    ("gbif_confidence", "confidence"),
    ("gbif_taxon_key", "usageKey"),
]);

/// ITIS Solr documents.
pub const ITIS_NAME_MAP: FieldMap = FieldMap::new(ServiceType::Name, KeyStyle::Name).with_renames(&[
    ("scientific_name", "nameWTaxonAuthor"),
    ("canonical_name", "nameWOInd"),
    ("hierarchy", "hierarchySoFarWRanks"),
    ("status", "usage"),
    ("itis_tsn", "tsn"),
    ("itis_credibility", "credibilityRating"),
]);

/// WoRMS Aphia records.
pub const WORMS_NAME_MAP: FieldMap = FieldMap::new(ServiceType::Name, KeyStyle::Name).with_renames(&[
    ("view_url", "url"),
    ("scientific_name", "valid_authority"),
    ("canonical_name", "valid_name"),
    ("worms_valid_AphiaID", "valid_AphiaID"),
    ("worms_lsid", "lsid"),
    ("worms_isMarine", "isMarine"),
    ("worms_isBrackish", "isBrackish"),
    ("worms_isFreshwater", "isFreshwater"),
    ("worms_isTerrestrial", "isTerrestrial"),
    ("worms_isExtinct", "isExtinct"),
    ("worms_match_type", "match_type"),
]);

/// IPNI citation records. Most canonical fields are assembled by the
/// adapter itself, so only rank maps straight across.
pub const IPNI_NAME_MAP: FieldMap = FieldMap::new(ServiceType::Name, KeyStyle::Name);

/// GBIF occurrence-search records are already keyed by canonical names.
pub const GBIF_OCCURRENCE_MAP: FieldMap = FieldMap::new(ServiceType::Occurrence, KeyStyle::Name);

/// iDigBio indexTerms records carry namespaced keys except their own uuid.
pub const IDIGBIO_OCCURRENCE_MAP: FieldMap =
    FieldMap::new(ServiceType::Occurrence, KeyStyle::WireKey).with_renames(&[("uuid", "uuid")]);

/// Specify portal records qualify every key with its namespace URL.
pub const SPECIFY_OCCURRENCE_MAP: FieldMap =
    FieldMap::new(ServiceType::Occurrence, KeyStyle::NamespaceUrl);

/// Specify cache records use bare names, with the cache's `identifier`
/// carrying the canonical specify identifier.
pub const SPECIFY_CACHE_OCCURRENCE_MAP: FieldMap =
    FieldMap::new(ServiceType::Occurrence, KeyStyle::Name)
        .with_renames(&[("specify_identifier", "identifier")]);

/// MorphoSource ships a narrow record under dotted specimen keys; canonical
/// fields it does not carry are left unmapped.
pub const MORPHOSOURCE_OCCURRENCE_MAP: FieldMap =
    FieldMap::new(ServiceType::Occurrence, KeyStyle::Name)
        .with_renames(&[
            ("catalogNumber", "specimen.catalog_number"),
            ("institutionCode", "specimen.institution_code"),
            ("uuid", "specimen.uuid"),
        ])
        .with_only(&["specimen.specimen_id", "view_url", "api_url"]);

/// Lifemapper projection and occurrence-set records.
pub const LIFEMAPPER_MAP_MAP: FieldMap = FieldMap::new(ServiceType::Map, KeyStyle::Name)
    .with_renames(&[("api_url", "url"), ("modtime", "status_mod_time")]);

/// Specify resolver ARK records.
pub const SPECIFY_RESOLVER_MAP: FieldMap = FieldMap::new(ServiceType::Resolve, KeyStyle::Name)
    .with_renames(&[
        ("ident", "id"),
        ("institutionCode", "who"),
        ("basisOfRecord", "what"),
        ("date", "when"),
        ("ark", "where"),
        ("api_url", "url"),
    ]);

/// Maps one provider record onto canonical wire keys, in schema order.
/// Mapped-but-absent values become `null`; unmapped canonical fields are
/// omitted and left to the schema formatter.
pub fn apply_field_map(map: &FieldMap, record: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = Map::new();
    for field in SchemaRegistry::fields(map.service()) {
        let Some(provider_key) = map.provider_key(field) else {
            continue;
        };
        let value = record.get(&provider_key).cloned().unwrap_or(Value::Null);
        mapped.insert(field.wire_key(), value);
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn gbif_name_renames_match_keys() {
        let rec = record(json!({
            "scientificName": "Poa annua L.",
            "canonicalName": "Poa annua",
            "confidence": 98,
            "usageKey": 2704179,
            "status": "ACCEPTED",
        }));
        let mapped = apply_field_map(&GBIF_NAME_MAP, &rec);

        assert_eq!(mapped["s2n:scientific_name"], json!("Poa annua L."));
        assert_eq!(mapped["s2n:gbif_confidence"], json!(98));
        assert_eq!(mapped["s2n:gbif_taxon_key"], json!(2704179));
        assert_eq!(mapped["s2n:status"], json!("ACCEPTED"));
    }

    #[test]
    fn idigbio_reads_namespaced_keys_except_uuid() {
        let rec = record(json!({
            "uuid": "a362dd2b",
            "dwc:catalogNumber": "KU 12345",
        }));
        let mapped = apply_field_map(&IDIGBIO_OCCURRENCE_MAP, &rec);

        assert_eq!(mapped["idigbio:uuid"], json!("a362dd2b"));
        assert_eq!(mapped["dwc:catalogNumber"], json!("KU 12345"));
    }

    #[test]
    fn specify_portal_uses_namespace_urls() {
        let rec = record(json!({
            "http://rs.tdwg.org/dwc/terms/catalogNumber": "42",
        }));
        let mapped = apply_field_map(&SPECIFY_OCCURRENCE_MAP, &rec);
        assert_eq!(mapped["dwc:catalogNumber"], json!("42"));
    }

    #[test]
    fn morphosource_maps_only_its_narrow_record() {
        let rec = record(json!({
            "specimen.catalog_number": "MCZ:Mamm:1",
            "specimen.uuid": "deadbeef",
            "specimen.specimen_id": 7,
            "dwc:country": "US",
        }));
        let mapped = apply_field_map(&MORPHOSOURCE_OCCURRENCE_MAP, &rec);

        assert_eq!(mapped["dwc:catalogNumber"], json!("MCZ:Mamm:1"));
        assert_eq!(mapped["idigbio:uuid"], json!("deadbeef"));
        assert_eq!(mapped["mopho:specimen.specimen_id"], json!(7));
        // Fields outside the whitelist are omitted, not nulled.
        assert!(!mapped.contains_key("dwc:country"));
    }

    #[test]
    fn resolver_maps_who_what_when_where() {
        let rec = record(json!({
            "id": "urn:uuid:1",
            "who": "KU",
            "what": "PreservedSpecimen",
            "when": "2021-09-01",
            "where": "http://n2t.net/ark:/12345",
            "url": "https://resolver.example/api/1",
        }));
        let mapped = apply_field_map(&SPECIFY_RESOLVER_MAP, &rec);

        assert_eq!(mapped["s2n:ident"], json!("urn:uuid:1"));
        assert_eq!(mapped["dwc:institutionCode"], json!("KU"));
        assert_eq!(mapped["dwc:basisOfRecord"], json!("PreservedSpecimen"));
        assert_eq!(mapped["s2n:date"], json!("2021-09-01"));
        assert_eq!(mapped["s2n:ark"], json!("http://n2t.net/ark:/12345"));
        assert_eq!(mapped["s2n:api_url"], json!("https://resolver.example/api/1"));
    }

    #[test]
    fn absent_mapped_values_become_null() {
        let mapped = apply_field_map(&GBIF_OCCURRENCE_MAP, &Map::new());
        assert_eq!(mapped["dwc:scientificName"], Value::Null);
    }
}
