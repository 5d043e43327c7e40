use thiserror::Error;

/// Validation and contract errors exposed by `biofed-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown provider code '{value}'")]
    UnknownProvider { value: String },
    #[error("provider '{provider}' does not serve '{service}'")]
    ProviderNotForService {
        provider: String,
        service: &'static str,
    },
    #[error("missing required parameter '{name}'")]
    MissingRequiredParam { name: &'static str },
    #[error("invalid value '{value}' for required parameter '{name}'")]
    InvalidRequiredParam { name: &'static str, value: String },
    #[error("badge requests accept exactly one provider, got {count}")]
    BadgeProviderCount { count: usize },
    #[error("'{value}' is not a valid UUID for parameter '{name}'")]
    MalformedUuid { name: &'static str, value: String },
    #[error("service '{service}' resolved no providers")]
    EmptyProviderSet { service: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
