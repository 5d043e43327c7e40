use biofed_core::{BadgeService, RawParams};
use serde_json::Value;

use crate::cli::BadgeArgs;
use crate::error::CliError;

pub fn run(args: &BadgeArgs) -> Result<Value, CliError> {
    let raw = RawParams::new()
        .set("provider", &args.provider)
        .set("icon_status", &args.icon_status);

    let response = BadgeService::new().run(&raw)?;
    Ok(serde_json::to_value(response)?)
}
