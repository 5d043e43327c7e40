use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ServiceType, ValidationError};

/// Canonical provider identifiers used in metadata and envelopes.
///
/// `Broker` is the synthetic self-identity stamped on top-level envelopes;
/// it never appears in a fan-out provider set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[serde(rename = "specifynetwork")]
    Broker,
    Gbif,
    #[serde(rename = "idb")]
    Idigbio,
    Ipni,
    Itis,
    #[serde(rename = "lm")]
    Lifemapper,
    #[serde(rename = "mopho")]
    Morphosource,
    Specify,
    Worms,
}

impl ProviderId {
    pub const ALL: [Self; 9] = [
        Self::Broker,
        Self::Gbif,
        Self::Idigbio,
        Self::Ipni,
        Self::Itis,
        Self::Lifemapper,
        Self::Morphosource,
        Self::Specify,
        Self::Worms,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Broker => "specifynetwork",
            Self::Gbif => "gbif",
            Self::Idigbio => "idb",
            Self::Ipni => "ipni",
            Self::Itis => "itis",
            Self::Lifemapper => "lm",
            Self::Morphosource => "mopho",
            Self::Specify => "specify",
            Self::Worms => "worms",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Broker => "Specify Network",
            Self::Gbif => "GBIF",
            Self::Idigbio => "iDigBio",
            Self::Ipni => "IPNI",
            Self::Itis => "ITIS",
            Self::Lifemapper => "Lifemapper",
            Self::Morphosource => "MorphoSource",
            Self::Specify => "Specify",
            Self::Worms => "WoRMS",
        }
    }

    /// Services each provider is registered for.
    pub const fn services(self) -> &'static [ServiceType] {
        match self {
            Self::Broker => &[ServiceType::Badge],
            Self::Gbif => &[ServiceType::Occurrence, ServiceType::Name, ServiceType::Badge],
            Self::Idigbio => &[ServiceType::Occurrence, ServiceType::Badge],
            Self::Ipni => &[ServiceType::Name],
            Self::Itis => &[ServiceType::Name, ServiceType::Badge],
            Self::Lifemapper => &[ServiceType::Map, ServiceType::Badge],
            Self::Morphosource => &[ServiceType::Occurrence, ServiceType::Badge],
            Self::Specify => &[
                ServiceType::Occurrence,
                ServiceType::Resolve,
                ServiceType::Badge,
            ],
            Self::Worms => &[ServiceType::Name, ServiceType::Badge],
        }
    }

    pub fn serves(self, service: ServiceType) -> bool {
        self.services().contains(&service)
    }

    /// Badge icon file for a given status, when the provider ships one.
    pub const fn icon_file(self, status: IconStatus) -> Option<&'static str> {
        match (self, status) {
            (Self::Gbif, IconStatus::Active) => Some("gbif_active-01.png"),
            (Self::Gbif, IconStatus::Inactive) => Some("gbif_inactive-01.png"),
            (Self::Gbif, IconStatus::Hover) => Some("gbif_hover-01-01.png"),
            (Self::Idigbio, IconStatus::Active) => Some("idigbio_colors_active-01.png"),
            (Self::Idigbio, IconStatus::Inactive) => Some("idigbio_colors_inactive-01.png"),
            (Self::Idigbio, IconStatus::Hover) => Some("idigbio_colors_hover-01.png"),
            (Self::Itis, IconStatus::Active) => Some("itis_active.png"),
            (Self::Itis, IconStatus::Inactive) => Some("itis_inactive.png"),
            (Self::Itis, IconStatus::Hover) => Some("itis_hover.png"),
            (Self::Lifemapper, IconStatus::Active) => Some("lm_active.png"),
            (Self::Lifemapper, IconStatus::Inactive) => Some("lm_inactive-01.png"),
            (Self::Lifemapper, IconStatus::Hover) => Some("lm_hover-01.png"),
            (Self::Morphosource, IconStatus::Active) => Some("morpho_active-01.png"),
            (Self::Morphosource, IconStatus::Inactive) => Some("morpho_inactive-01.png"),
            (Self::Morphosource, IconStatus::Hover) => Some("morpho_hover-01.png"),
            (Self::Specify, IconStatus::Active) => Some("specify_network_active.png"),
            (Self::Worms, IconStatus::Active) => Some("worms_active.png"),
            _ => None,
        }
    }

    /// Providers registered for a service, ordered specify-first then
    /// alphabetically by code. The broker self-identity is excluded.
    pub fn for_service(service: ServiceType) -> Vec<Self> {
        let providers = Self::ALL
            .into_iter()
            .filter(|provider| *provider != Self::Broker && provider.serves(service))
            .collect::<Vec<_>>();
        order_providers(providers)
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "specifynetwork" => Ok(Self::Broker),
            "gbif" => Ok(Self::Gbif),
            "idb" => Ok(Self::Idigbio),
            "ipni" => Ok(Self::Ipni),
            "itis" => Ok(Self::Itis),
            "lm" => Ok(Self::Lifemapper),
            "mopho" => Ok(Self::Morphosource),
            "specify" => Ok(Self::Specify),
            "worms" => Ok(Self::Worms),
            other => Err(ValidationError::UnknownProvider {
                value: other.to_owned(),
            }),
        }
    }
}

/// Badge icon variant requested through the badge service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconStatus {
    Active,
    Inactive,
    Hover,
}

impl IconStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Hover];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Hover => "hover",
        }
    }
}

impl Display for IconStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IconStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "hover" => Ok(Self::Hover),
            other => Err(ValidationError::InvalidRequiredParam {
                name: "icon_status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Deterministic provider ordering: `specify` pinned first, the rest
/// alphabetical by code. Duplicates are dropped, first occurrence wins.
pub fn order_providers(providers: Vec<ProviderId>) -> Vec<ProviderId> {
    let mut unique = Vec::with_capacity(providers.len());
    for provider in providers {
        if !unique.contains(&provider) {
            unique.push(provider);
        }
    }
    unique.sort_by(|a, b| {
        let a_key = (*a != ProviderId::Specify, a.as_str());
        let b_key = (*b != ProviderId::Specify, b.as_str());
        a_key.cmp(&b_key)
    });
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_providers_are_specify_first_then_alphabetical() {
        let providers = ProviderId::for_service(ServiceType::Occurrence);
        assert_eq!(
            providers,
            vec![
                ProviderId::Specify,
                ProviderId::Gbif,
                ProviderId::Idigbio,
                ProviderId::Morphosource,
            ]
        );
    }

    #[test]
    fn name_providers_include_the_nomenclatural_indexes() {
        let providers = ProviderId::for_service(ServiceType::Name);
        assert_eq!(
            providers,
            vec![
                ProviderId::Gbif,
                ProviderId::Ipni,
                ProviderId::Itis,
                ProviderId::Worms,
            ]
        );
    }

    #[test]
    fn ordering_dedupes_and_pins_specify() {
        let ordered = order_providers(vec![
            ProviderId::Worms,
            ProviderId::Gbif,
            ProviderId::Specify,
            ProviderId::Gbif,
        ]);
        assert_eq!(
            ordered,
            vec![ProviderId::Specify, ProviderId::Gbif, ProviderId::Worms]
        );
    }

    #[test]
    fn unknown_code_is_a_validation_error() {
        let err = "ebird".parse::<ProviderId>().expect_err("must fail");
        assert!(matches!(err, ValidationError::UnknownProvider { .. }));
    }

    #[test]
    fn worms_has_only_an_active_icon() {
        assert_eq!(
            ProviderId::Worms.icon_file(IconStatus::Active),
            Some("worms_active.png")
        );
        assert_eq!(ProviderId::Worms.icon_file(IconStatus::Hover), None);
    }
}
