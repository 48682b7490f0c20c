//! CLI command definitions

use crate::artifacts::ServerType;
use clap::Args;

/// Parse a version and resolve its artifacts
#[derive(Debug, Args, Clone)]
pub struct ResolveCommand {
    /// Version token, e.g. `2.4.5`, `2.5.0-SNAPSHOT`, `latest-2` or `<hash>:2.5.0`
    pub version: String,

    /// Plugins to resolve alongside the server
    #[arg(long)]
    pub plugin: Vec<String>,

    /// Server product family
    #[arg(long, value_enum, default_value_t = ServerTypeArg::OpenSearch)]
    pub server_type: ServerTypeArg,

    /// Target platform, e.g. `linux-x64`; defaults to the current one
    #[arg(long)]
    pub platform: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a cluster configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to cluster YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the installation tasks
#[derive(Debug, Args, Clone)]
pub struct ProvisionCommand {
    /// Path to cluster YAML file
    #[arg(short, long)]
    pub file: String,
}

/// Check the version a running node reports
#[derive(Debug, Args, Clone)]
pub struct CheckVersionCommand {
    /// Path to cluster YAML file
    #[arg(short, long)]
    pub file: String,
}

/// Server type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServerTypeArg {
    #[value(name = "opensearch")]
    OpenSearch,
    #[value(name = "opendistro")]
    OpenDistro,
    #[value(name = "elasticsearch")]
    ElasticSearch,
}

impl From<ServerTypeArg> for ServerType {
    fn from(arg: ServerTypeArg) -> Self {
        match arg {
            ServerTypeArg::OpenSearch => ServerType::OpenSearch,
            ServerTypeArg::OpenDistro => ServerType::OpenDistro,
            ServerTypeArg::ElasticSearch => ServerType::ElasticSearch,
        }
    }
}
