use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Logical broker service used for routing and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Name,
    #[serde(rename = "occ")]
    Occurrence,
    Map,
    Resolve,
    Badge,
}

impl ServiceType {
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::Occurrence,
        Self::Map,
        Self::Resolve,
        Self::Badge,
    ];

    /// Endpoint segment used in wire envelopes and self-query URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Occurrence => "occ",
            Self::Map => "map",
            Self::Resolve => "resolve",
            Self::Badge => "badge",
        }
    }

    /// Parameters recognized by this service; unknown request keys are ignored.
    pub const fn recognized_params(self) -> &'static [&'static str] {
        match self {
            Self::Name => &[
                "provider",
                "namestr",
                "is_accepted",
                "gbif_parse",
                "gbif_count",
                "kingdom",
            ],
            Self::Occurrence => &["provider", "occid", "gbif_dataset_key", "count_only"],
            Self::Map => &[
                "provider",
                "namestr",
                "gbif_parse",
                "is_accepted",
                "scenariocode",
                "color",
            ],
            Self::Resolve => &["occid"],
            Self::Badge => &["provider", "icon_status"],
        }
    }

    pub const fn record_format(self) -> Option<&'static str> {
        match self {
            Self::Badge => Some("image/png"),
            _ => None,
        }
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_serializes_as_occ() {
        let value = serde_json::to_value(ServiceType::Occurrence).expect("serializable");
        assert_eq!(value, serde_json::json!("occ"));
    }

    #[test]
    fn badge_recognizes_only_its_params() {
        assert_eq!(
            ServiceType::Badge.recognized_params(),
            &["provider", "icon_status"]
        );
    }
}
