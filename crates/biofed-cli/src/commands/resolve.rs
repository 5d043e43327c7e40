use biofed_core::{RawParams, ResolveService};
use serde_json::Value;

use crate::cli::ResolveArgs;
use crate::error::CliError;

use super::Broker;

pub async fn run(args: &ResolveArgs, broker: &Broker) -> Result<Value, CliError> {
    let raw = RawParams::new().set("occid", &args.occid);

    let service = ResolveService::new(broker.registry.clone());
    let response = service.run(&raw).await?;
    Ok(serde_json::to_value(response)?)
}
