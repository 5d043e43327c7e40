use biofed_core::ProviderId;
use serde_json::{json, Value};

use crate::error::CliError;

pub fn run() -> Result<Value, CliError> {
    let providers = ProviderId::ALL
        .into_iter()
        .map(|provider| {
            let services = provider
                .services()
                .iter()
                .map(|service| service.as_str())
                .collect::<Vec<_>>();
            json!({
                "code": provider.as_str(),
                "label": provider.label(),
                "services": services,
            })
        })
        .collect::<Vec<_>>();

    Ok(json!({ "providers": providers }))
}
