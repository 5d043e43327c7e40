use clap::{Args, Parser, Subcommand};

/// Aggregate biodiversity provider responses from the command line.
#[derive(Debug, Parser)]
#[command(name = "biofed", version, about = "Biodiversity provider-federation broker")]
pub struct Cli {
    /// Pretty-print the JSON envelope.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Match a scientific name against the name providers.
    Name(NameArgs),
    /// Fetch occurrence records for a specimen identifier.
    Occ(OccArgs),
    /// Fetch species-distribution map layers for a name.
    Map(MapArgs),
    /// Resolve a specimen GUID to its ARK record.
    Resolve(ResolveArgs),
    /// Look up a provider's badge icon.
    Badge(BadgeArgs),
    /// List the registered providers and the services each answers.
    Providers,
}

#[derive(Debug, Args)]
pub struct NameArgs {
    /// Scientific name, with or without author.
    pub namestr: String,

    /// Comma-separated provider codes; defaults to every name provider.
    #[arg(long)]
    pub provider: Option<String>,

    /// Limit results to accepted/valid taxa (true/false).
    #[arg(long)]
    pub is_accepted: Option<String>,

    /// Run the name through the GBIF parser first (true/false).
    #[arg(long)]
    pub gbif_parse: Option<String>,

    /// Attach GBIF occurrence counts to each name record (true/false).
    #[arg(long)]
    pub gbif_count: Option<String>,

    /// Kingdom filter, honored by ITIS.
    #[arg(long)]
    pub kingdom: Option<String>,
}

#[derive(Debug, Args)]
pub struct OccArgs {
    /// dwc:occurrenceID of the specimen record.
    #[arg(long)]
    pub occid: Option<String>,

    /// GBIF dataset key; restricts the query to GBIF.
    #[arg(long)]
    pub gbif_dataset_key: Option<String>,

    /// Comma-separated provider codes; defaults to every occurrence provider.
    #[arg(long)]
    pub provider: Option<String>,

    /// Report counts without records (true/false).
    #[arg(long)]
    pub count_only: Option<String>,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Scientific name, with or without author.
    pub namestr: String,

    /// Comma-separated provider codes; defaults to every map provider.
    #[arg(long)]
    pub provider: Option<String>,

    /// Treat the name as already accepted, skipping the GBIF backbone match.
    #[arg(long)]
    pub is_accepted: Option<String>,

    /// Run the name through the GBIF parser first (true/false).
    #[arg(long)]
    pub gbif_parse: Option<String>,

    /// Comma-separated projection scenario codes.
    #[arg(long)]
    pub scenariocode: Option<String>,

    /// Palette for rendered distribution layers.
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Specimen GUID to resolve.
    pub occid: String,
}

#[derive(Debug, Args)]
pub struct BadgeArgs {
    /// Exactly one badge-capable provider code.
    #[arg(long)]
    pub provider: String,

    /// Icon variant: active, inactive or hover.
    #[arg(long)]
    pub icon_status: String,
}
