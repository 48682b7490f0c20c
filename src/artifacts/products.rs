//! Products that can be resolved to downloadable artifacts

use crate::version::{StructuredVersion, VersionRange};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Server product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    #[default]
    OpenSearch,
    OpenDistro,
    ElasticSearch,
}

impl ServerType {
    /// Product identifier used in artifact names and cache keys
    pub fn product_id(&self) -> &'static str {
        match self {
            ServerType::OpenSearch => "opensearch",
            ServerType::OpenDistro => "opendistroforelasticsearch",
            ServerType::ElasticSearch => "elasticsearch",
        }
    }

    /// Name of the plugin management binary under `bin/`
    pub fn plugin_binary_name(&self) -> &'static str {
        match self {
            ServerType::OpenSearch => "opensearch-plugin",
            ServerType::OpenDistro | ServerType::ElasticSearch => "elasticsearch-plugin",
        }
    }

    /// Main YAML configuration file under `config/`
    pub fn main_config_file(&self) -> &'static str {
        match self {
            ServerType::OpenSearch => "opensearch.yml",
            ServerType::OpenDistro | ServerType::ElasticSearch => "elasticsearch.yml",
        }
    }

    /// Directive that turns the security plugin off, if the family ships one
    pub fn security_disable_directive(&self) -> Option<&'static str> {
        match self {
            ServerType::OpenSearch => Some("plugins.security.disabled: true"),
            ServerType::OpenDistro => Some("opendistro_security.disabled: true"),
            ServerType::ElasticSearch => None,
        }
    }

    /// Environment variable pointing the node at its config directory
    pub fn path_conf_env(&self) -> &'static str {
        match self {
            ServerType::OpenSearch => "OPENSEARCH_PATH_CONF",
            ServerType::OpenDistro | ServerType::ElasticSearch => "ES_PATH_CONF",
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerType::OpenSearch => write!(f, "OpenSearch"),
            ServerType::OpenDistro => write!(f, "OpenDistro"),
            ServerType::ElasticSearch => write!(f, "ElasticSearch"),
        }
    }
}

fn any_version() -> String {
    "*".to_string()
}

/// A plugin that may be installed into a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Plugin name, also its directory under `plugins/`
    pub name: String,

    /// Versions of the server this plugin can be installed into
    #[serde(default = "any_version")]
    pub valid_range: String,

    /// First server version bundling this plugin
    #[serde(default)]
    pub shipped_out_of_box_as_of: Option<String>,
}

impl PluginSpec {
    /// A plugin valid for every version and never bundled
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            valid_range: any_version(),
            shipped_out_of_box_as_of: None,
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.valid_range = range.into();
        self
    }

    pub fn shipped_as_of(mut self, version: impl Into<String>) -> Self {
        self.shipped_out_of_box_as_of = Some(version.into());
        self
    }

    /// Look up a plugin from the catalog of well known plugins, falling back
    /// to an unconstrained spec for unknown names
    pub fn known(name: &str) -> Self {
        match name {
            "opensearch-security" => Self::new(name).with_range(">=1.0.0").shipped_as_of("1.0.0"),
            "analysis-icu" | "analysis-kuromoji" | "analysis-nori" | "analysis-phonetic"
            | "analysis-smartcn" | "analysis-stempel" | "analysis-ukrainian"
            | "ingest-attachment" | "mapper-murmur3" | "mapper-size" | "repository-s3"
            | "repository-azure" | "repository-gcs" | "repository-hdfs" | "discovery-ec2"
            | "store-smb" => Self::new(name).with_range(">=1.0.0"),
            "transport-nio" => Self::new(name).with_range(">=1.0.0 <3.0.0"),
            _ => Self::new(name),
        }
    }

    /// Whether the plugin can be installed into `version`.
    ///
    /// An unparsable range rejects every version.
    pub fn is_valid_for(&self, version: &StructuredVersion) -> bool {
        VersionRange::parse(&self.valid_range)
            .map(|range| version.in_range(&range))
            .unwrap_or(false)
    }

    /// Whether `version` already bundles this plugin
    pub fn is_shipped_out_of_box(&self, version: &StructuredVersion) -> bool {
        self.shipped_out_of_box_as_of
            .as_deref()
            .and_then(|as_of| version.compare_to_str(as_of).ok())
            .is_some_and(|ordering| ordering != Ordering::Less)
    }
}

/// Something an artifact can be resolved for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
    Server(ServerType),
    Plugin(PluginSpec),
}

impl Product {
    /// Stable identifier, also the resolution cache key
    pub fn id(&self) -> String {
        match self {
            Product::Server(server) => server.product_id().to_string(),
            Product::Plugin(plugin) => plugin.name.clone(),
        }
    }

    pub fn as_plugin(&self) -> Option<&PluginSpec> {
        match self {
            Product::Plugin(plugin) => Some(plugin),
            Product::Server(_) => None,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
