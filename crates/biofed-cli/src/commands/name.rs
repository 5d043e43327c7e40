use biofed_core::{NameService, RawParams};
use serde_json::Value;

use crate::cli::NameArgs;
use crate::error::CliError;

use super::Broker;

pub async fn run(args: &NameArgs, broker: &Broker) -> Result<Value, CliError> {
    let mut raw = RawParams::new().set("namestr", &args.namestr);
    if let Some(provider) = &args.provider {
        raw = raw.set("provider", provider);
    }
    if let Some(is_accepted) = &args.is_accepted {
        raw = raw.set("is_accepted", is_accepted);
    }
    if let Some(gbif_parse) = &args.gbif_parse {
        raw = raw.set("gbif_parse", gbif_parse);
    }
    if let Some(gbif_count) = &args.gbif_count {
        raw = raw.set("gbif_count", gbif_count);
    }
    if let Some(kingdom) = &args.kingdom {
        raw = raw.set("kingdom", kingdom);
    }

    let service = NameService::new(broker.registry.clone(), broker.executor.clone());
    let response = service.run(&raw).await?;
    Ok(serde_json::to_value(response)?)
}
