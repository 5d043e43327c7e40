mod badge;
mod map;
mod name;
mod occ;
mod providers;
mod resolve;

use std::sync::Arc;

use biofed_core::{AdapterRegistry, QueryExecutor, ReqwestHttpClient};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Shared wiring for every subcommand: one HTTP client behind a query
/// executor, and the adapter registry built on top of it.
pub struct Broker {
    pub registry: Arc<AdapterRegistry>,
    pub executor: QueryExecutor,
}

impl Broker {
    pub fn connect() -> Self {
        let executor = QueryExecutor::new(Arc::new(ReqwestHttpClient::new()));
        let registry = Arc::new(AdapterRegistry::with_executor(executor.clone()));
        Self { registry, executor }
    }
}

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let broker = Broker::connect();

    match &cli.command {
        Command::Name(args) => name::run(args, &broker).await,
        Command::Occ(args) => occ::run(args, &broker).await,
        Command::Map(args) => map::run(args, &broker).await,
        Command::Resolve(args) => resolve::run(args, &broker).await,
        Command::Badge(args) => badge::run(args),
        Command::Providers => providers::run(),
    }
}
