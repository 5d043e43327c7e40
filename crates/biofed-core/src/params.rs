use std::collections::BTreeMap;
use std::str::FromStr;

use uuid::Uuid;

use crate::envelope::ErrInfo;
use crate::provider::{order_providers, IconStatus, ProviderId};
use crate::{ServiceType, ValidationError};

/// Lifemapper projection scenario codes accepted by the map service.
pub const SCENARIO_CODES: &[&str] = &[
    "worldclim-curr",
    "CMIP5-CCSM4-lgm-10min",
    "CMIP5-CCSM4-mid-10min",
    "AR5-CCSM4-RCP8.5-2050-10min",
    "AR5-CCSM4-RCP4.5-2050-10min",
    "AR5-CCSM4-RCP4.5-2070-10min",
    "AR5-CCSM4-RCP8.5-2070-10min",
];

/// Map layer color palettes accepted by the map service.
pub const COLOR_PALETTES: &[&str] = &[
    "red", "gray", "green", "blue", "safe", "pretty", "yellow", "fuschia", "aqua", "bluered",
    "bluegreen", "greenred",
];

/// Declared value type of a request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Bool,
}

/// Declarative description of one recognized request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: Option<&'static str>,
    pub options: Option<&'static [&'static str]>,
    pub multi: bool,
    pub required: bool,
}

const ICON_OPTIONS: &[&str] = &["active", "inactive", "hover"];

/// The broker parameter table. Unknown request keys are ignored; lookups
/// go through [`param_spec`].
pub const PARAMETERS: &[ParamSpec] = &[
    ParamSpec {
        name: "provider",
        kind: ParamKind::Str,
        default: None,
        options: None,
        multi: true,
        required: false,
    },
    ParamSpec {
        name: "namestr",
        kind: ParamKind::Str,
        default: None,
        options: None,
        multi: false,
        required: true,
    },
    ParamSpec {
        name: "is_accepted",
        kind: ParamKind::Bool,
        default: Some("false"),
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "gbif_parse",
        kind: ParamKind::Bool,
        default: Some("false"),
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "gbif_count",
        kind: ParamKind::Bool,
        default: Some("false"),
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "kingdom",
        kind: ParamKind::Str,
        default: None,
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "occid",
        kind: ParamKind::Str,
        default: None,
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "gbif_dataset_key",
        kind: ParamKind::Str,
        default: None,
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "count_only",
        kind: ParamKind::Bool,
        default: Some("false"),
        options: None,
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "scenariocode",
        kind: ParamKind::Str,
        default: None,
        options: Some(SCENARIO_CODES),
        multi: true,
        required: false,
    },
    ParamSpec {
        name: "color",
        kind: ParamKind::Str,
        default: Some("red"),
        options: Some(COLOR_PALETTES),
        multi: false,
        required: false,
    },
    ParamSpec {
        name: "icon_status",
        kind: ParamKind::Str,
        default: None,
        options: Some(ICON_OPTIONS),
        multi: false,
        required: true,
    },
];

pub fn param_spec(name: &str) -> Option<&'static ParamSpec> {
    PARAMETERS.iter().find(|spec| spec.name == name)
}

/// Raw request parameters as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams(BTreeMap<String, String>);

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Query-term rendering used for the broker's self-query URL.
    pub fn query_term(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |raw, (key, value)| raw.set(key, value))
    }
}

/// Validated, immutable per-service request objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRequest {
    pub namestr: String,
    pub providers: Vec<ProviderId>,
    pub is_accepted: bool,
    pub gbif_parse: bool,
    pub gbif_count: bool,
    pub kingdom: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccRequest {
    pub occid: Option<String>,
    pub gbif_dataset_key: Option<String>,
    pub count_only: bool,
    pub providers: Vec<ProviderId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRequest {
    pub namestr: String,
    pub providers: Vec<ProviderId>,
    pub is_accepted: bool,
    pub gbif_parse: bool,
    pub scenariocodes: Vec<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub occid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRequest {
    pub provider: ProviderId,
    pub icon_status: IconStatus,
}

/// Validates raw parameters against the parameter table and resolves the
/// provider set for each logical service. Pure over the static registries.
///
/// Invalid optional values substitute the declared default and record a
/// warning; missing or invalid required values are a hard error and no
/// provider is ever contacted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterResolver;

impl ParameterResolver {
    pub fn resolve_name(raw: &RawParams) -> Result<(NameRequest, ErrInfo), ValidationError> {
        let mut warnings = ErrInfo::new();
        let namestr = required_string(raw, "namestr")?;
        let providers = resolve_providers(raw.get("provider"), ServiceType::Name, &mut warnings)?;
        let request = NameRequest {
            namestr,
            providers,
            is_accepted: bool_param(raw, "is_accepted", &mut warnings),
            gbif_parse: bool_param(raw, "gbif_parse", &mut warnings),
            gbif_count: bool_param(raw, "gbif_count", &mut warnings),
            kingdom: raw.get("kingdom").map(|v| v.trim().to_owned()),
        };
        Ok((request, warnings))
    }

    pub fn resolve_occ(raw: &RawParams) -> Result<(OccRequest, ErrInfo), ValidationError> {
        let mut warnings = ErrInfo::new();
        let occid = raw
            .get("occid")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let dataset_key = raw
            .get("gbif_dataset_key")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        if occid.is_none() && dataset_key.is_none() {
            return Err(ValidationError::MissingRequiredParam { name: "occid" });
        }
        if let Some(key) = &dataset_key {
            if Uuid::parse_str(key).is_err() {
                return Err(ValidationError::MalformedUuid {
                    name: "gbif_dataset_key",
                    value: key.clone(),
                });
            }
        }

        let mut providers =
            resolve_providers(raw.get("provider"), ServiceType::Occurrence, &mut warnings)?;
        // A dataset key is answerable by GBIF alone.
        if dataset_key.is_some() {
            providers.retain(|provider| *provider == ProviderId::Gbif);
            if providers.is_empty() {
                providers.push(ProviderId::Gbif);
            }
        }

        let request = OccRequest {
            occid,
            gbif_dataset_key: dataset_key,
            count_only: bool_param(raw, "count_only", &mut warnings),
            providers,
        };
        Ok((request, warnings))
    }

    pub fn resolve_map(raw: &RawParams) -> Result<(MapRequest, ErrInfo), ValidationError> {
        let mut warnings = ErrInfo::new();
        let namestr = required_string(raw, "namestr")?;
        let providers = resolve_providers(raw.get("provider"), ServiceType::Map, &mut warnings)?;
        let request = MapRequest {
            namestr,
            providers,
            is_accepted: bool_param(raw, "is_accepted", &mut warnings),
            gbif_parse: bool_param(raw, "gbif_parse", &mut warnings),
            scenariocodes: multi_option_param(raw, "scenariocode", &mut warnings),
            color: option_param(raw, "color", &mut warnings),
        };
        Ok((request, warnings))
    }

    pub fn resolve_resolve(raw: &RawParams) -> Result<(ResolveRequest, ErrInfo), ValidationError> {
        let occid = required_string(raw, "occid")?;
        Ok((ResolveRequest { occid }, ErrInfo::new()))
    }

    /// Badge requires exactly one badge-capable provider and a valid
    /// icon status; both failures are caller-visible errors.
    pub fn resolve_badge(raw: &RawParams) -> Result<(BadgeRequest, ErrInfo), ValidationError> {
        let warnings = ErrInfo::new();
        let provider_raw = raw
            .get("provider")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingRequiredParam { name: "provider" })?;
        let tokens = provider_raw.split(',').collect::<Vec<_>>();
        if tokens.len() != 1 {
            return Err(ValidationError::BadgeProviderCount {
                count: tokens.len(),
            });
        }
        let provider = ProviderId::from_str(tokens[0])?;
        if !provider.serves(ServiceType::Badge) {
            return Err(ValidationError::ProviderNotForService {
                provider: provider.as_str().to_owned(),
                service: ServiceType::Badge.as_str(),
            });
        }

        let status_raw = raw
            .get("icon_status")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingRequiredParam { name: "icon_status" })?;
        let icon_status = IconStatus::from_str(status_raw)?;

        Ok((BadgeRequest { provider, icon_status }, warnings))
    }
}

fn required_string(raw: &RawParams, name: &'static str) -> Result<String, ValidationError> {
    raw.get(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(ValidationError::MissingRequiredParam { name })
}

/// Comma-separated provider codes resolved against the service's registered
/// set. Invalid entries warn; an empty valid subset falls back to all
/// providers registered for the service.
fn resolve_providers(
    requested: Option<&str>,
    service: ServiceType,
    warnings: &mut ErrInfo,
) -> Result<Vec<ProviderId>, ValidationError> {
    let registered = ProviderId::for_service(service);
    let Some(requested) = requested.map(str::trim).filter(|v| !v.is_empty()) else {
        return default_set(registered, service);
    };

    let mut valid = Vec::new();
    for token in requested.split(',') {
        let token = token.trim().to_ascii_lowercase();
        if token.is_empty() {
            continue;
        }
        match ProviderId::from_str(&token) {
            Ok(provider) if provider.serves(service) => valid.push(provider),
            _ => warnings.push_warning(format!(
                "Ignoring value {} for parameter provider (valid options: {:?})",
                token,
                registered
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
            )),
        }
    }

    if valid.is_empty() {
        return default_set(registered, service);
    }
    Ok(order_providers(valid))
}

fn default_set(
    registered: Vec<ProviderId>,
    service: ServiceType,
) -> Result<Vec<ProviderId>, ValidationError> {
    if registered.is_empty() {
        return Err(ValidationError::EmptyProviderSet {
            service: service.as_str(),
        });
    }
    Ok(registered)
}

fn bool_param(raw: &RawParams, name: &'static str, warnings: &mut ErrInfo) -> bool {
    let default = param_spec(name)
        .and_then(|spec| spec.default)
        .is_some_and(|value| value == "true");
    let Some(value) = raw.get(name) else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "t" | "true" => true,
        "0" | "n" | "no" | "f" | "false" => false,
        other => {
            warnings.push_warning(format!(
                "Value {other} for parameter {name} is not boolean, using {default}"
            ));
            default
        }
    }
}

/// Single-value parameter with a restricted option set: an invalid value
/// substitutes the default and warns.
fn option_param(raw: &RawParams, name: &'static str, warnings: &mut ErrInfo) -> Option<String> {
    let spec = param_spec(name)?;
    let default = spec.default.map(str::to_owned);
    let Some(value) = raw.get(name) else {
        return default;
    };
    let value = value.trim().to_ascii_lowercase();
    let options = spec.options.unwrap_or(&[]);
    if options.iter().any(|option| *option == value) {
        Some(value)
    } else {
        warnings.push_warning(format!(
            "Value {value} for parameter {name} not in valid options {options:?}"
        ));
        default
    }
}

/// Multi-value parameter with a restricted option set: invalid entries are
/// dropped with a warning, valid ones kept in request order.
fn multi_option_param(raw: &RawParams, name: &'static str, warnings: &mut ErrInfo) -> Vec<String> {
    let Some(value) = raw.get(name) else {
        return Vec::new();
    };
    let options = param_spec(name).and_then(|spec| spec.options).unwrap_or(&[]);
    let mut valid = Vec::new();
    for token in value.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match options.iter().find(|option| option.eq_ignore_ascii_case(token)) {
            Some(option) => {
                if !valid.contains(&(*option).to_owned()) {
                    valid.push((*option).to_owned());
                }
            }
            None => warnings.push_warning(format!(
                "Ignoring invalid value {token} for parameter {name} (valid options: {options:?})"
            )),
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_all_name_providers() {
        let raw = RawParams::new().set("namestr", "Poa annua");
        let (request, warnings) = ParameterResolver::resolve_name(&raw).expect("valid");

        assert_eq!(
            request.providers,
            vec![
                ProviderId::Gbif,
                ProviderId::Ipni,
                ProviderId::Itis,
                ProviderId::Worms,
            ]
        );
        assert!(!request.is_accepted);
        assert!(warnings.is_empty());
    }

    #[test]
    fn invalid_provider_token_warns_and_falls_back() {
        let raw = RawParams::new()
            .set("namestr", "Poa annua")
            .set("provider", "ebird");
        let (request, warnings) = ParameterResolver::resolve_name(&raw).expect("valid");

        assert_eq!(request.providers.len(), 4);
        assert_eq!(warnings.warning.len(), 1);
    }

    #[test]
    fn explicit_provider_subset_is_honored() {
        let raw = RawParams::new()
            .set("namestr", "Poa annua")
            .set("provider", "ipni");
        let (request, warnings) = ParameterResolver::resolve_name(&raw).expect("valid");

        assert_eq!(request.providers, vec![ProviderId::Ipni]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn dataset_key_restricts_occ_to_gbif() {
        let raw = RawParams::new()
            .set("gbif_dataset_key", "d7dddbf4-2cf0-4f39-9b2a-bb099caae36c");
        let (request, _) = ParameterResolver::resolve_occ(&raw).expect("valid");

        assert_eq!(request.providers, vec![ProviderId::Gbif]);
        assert!(request.occid.is_none());
    }

    #[test]
    fn malformed_dataset_key_is_an_error() {
        let raw = RawParams::new().set("gbif_dataset_key", "not-a-uuid");
        let err = ParameterResolver::resolve_occ(&raw).expect_err("must fail");
        assert!(matches!(err, ValidationError::MalformedUuid { .. }));
    }

    #[test]
    fn occ_without_identifier_is_an_error() {
        let err = ParameterResolver::resolve_occ(&RawParams::new()).expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::MissingRequiredParam { name: "occid" }
        ));
    }

    #[test]
    fn badge_requires_provider_and_status() {
        let err = ParameterResolver::resolve_badge(&RawParams::new()).expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::MissingRequiredParam { name: "provider" }
        ));

        let raw = RawParams::new().set("provider", "gbif,idb").set("icon_status", "active");
        let err = ParameterResolver::resolve_badge(&raw).expect_err("must fail");
        assert!(matches!(err, ValidationError::BadgeProviderCount { count: 2 }));

        let raw = RawParams::new().set("provider", "gbif").set("icon_status", "shiny");
        let err = ParameterResolver::resolve_badge(&raw).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidRequiredParam { .. }));
    }

    #[test]
    fn invalid_scenariocode_warns_but_keeps_valid_ones() {
        let raw = RawParams::new()
            .set("namestr", "Poa annua")
            .set("scenariocode", "worldclim-curr,marsclim-3000");
        let (request, warnings) = ParameterResolver::resolve_map(&raw).expect("valid");

        assert_eq!(request.scenariocodes, vec![String::from("worldclim-curr")]);
        assert_eq!(warnings.warning.len(), 1);
    }

    #[test]
    fn invalid_color_substitutes_default_with_warning() {
        let raw = RawParams::new()
            .set("namestr", "Poa annua")
            .set("color", "plaid");
        let (request, warnings) = ParameterResolver::resolve_map(&raw).expect("valid");

        assert_eq!(request.color.as_deref(), Some("red"));
        assert_eq!(warnings.warning.len(), 1);
    }
}
