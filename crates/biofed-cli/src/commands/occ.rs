use biofed_core::{OccurrenceService, RawParams};
use serde_json::Value;

use crate::cli::OccArgs;
use crate::error::CliError;

use super::Broker;

pub async fn run(args: &OccArgs, broker: &Broker) -> Result<Value, CliError> {
    let mut raw = RawParams::new();
    if let Some(occid) = &args.occid {
        raw = raw.set("occid", occid);
    }
    if let Some(dataset_key) = &args.gbif_dataset_key {
        raw = raw.set("gbif_dataset_key", dataset_key);
    }
    if let Some(provider) = &args.provider {
        raw = raw.set("provider", provider);
    }
    if let Some(count_only) = &args.count_only {
        raw = raw.set("count_only", count_only);
    }

    let service = OccurrenceService::new(broker.registry.clone());
    let response = service.run(&raw).await?;
    Ok(serde_json::to_value(response)?)
}
