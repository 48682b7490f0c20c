//! Cluster configuration from YAML

use crate::artifacts::{ArtifactEndpoints, PluginSpec, ServerType};
use crate::version::{StructuredVersion, VersionRange};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A plugin given either by name or as a full spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    /// Name from the catalog of well known plugins
    Name(String),
    /// Fully specified plugin
    Spec(PluginSpec),
}

impl PluginEntry {
    pub fn to_spec(&self) -> PluginSpec {
        match self {
            PluginEntry::Name(name) => PluginSpec::known(name),
            PluginEntry::Spec(spec) => spec.clone(),
        }
    }
}

/// Top-level cluster configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Version token, e.g. `2.4.5`, `latest-2` or `<hash>:2.5.0`
    pub version: String,

    #[serde(default)]
    pub server_type: ServerType,

    /// Node home directory
    pub home: PathBuf,

    /// Folder for downloads and cached homes
    #[serde(default)]
    pub local_folder: Option<PathBuf>,

    #[serde(default)]
    pub plugins: Vec<PluginEntry>,

    #[serde(default)]
    pub enable_ssl: bool,

    /// Keep a copy of the provisioned home to skip setup on later runs
    #[serde(default)]
    pub cache_home_installation: bool,

    /// Reject the whole plugin batch if any plugin does not fit the version
    #[serde(default = "default_true")]
    pub validate_plugins_before_install: bool,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default)]
    pub artifacts: ArtifactEndpoints,
}

fn default_true() -> bool {
    true
}

fn default_http_port() -> u16 {
    9200
}

impl ClusterConfig {
    /// Load cluster configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse cluster configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ClusterConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the cluster configuration
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            anyhow::bail!("No version configured");
        }

        if self.home.as_os_str().is_empty() {
            anyhow::bail!("No home directory configured");
        }

        let mut seen = HashSet::new();
        for plugin in self.plugin_specs() {
            if !seen.insert(plugin.name.clone()) {
                anyhow::bail!("Duplicate plugin: {}", plugin.name);
            }
            if let Err(e) = VersionRange::parse(&plugin.valid_range) {
                anyhow::bail!("Plugin '{}' has an invalid range: {}", plugin.name, e);
            }
            if let Some(as_of) = &plugin.shipped_out_of_box_as_of {
                if semver::Version::parse(as_of).is_err() {
                    anyhow::bail!(
                        "Plugin '{}' has an invalid out-of-box version: {}",
                        plugin.name,
                        as_of
                    );
                }
            }
        }

        if let Some(folder) = &self.local_folder {
            if !folder.is_absolute() {
                anyhow::bail!("local_folder must be an absolute path: {}", folder.display());
            }
            // the cached home is copied out of home into local_folder
            if folder.starts_with(&self.home) {
                anyhow::bail!(
                    "local_folder {} must not be inside home {}",
                    folder.display(),
                    self.home.display()
                );
            }
        }

        Ok(())
    }

    pub fn plugin_specs(&self) -> Vec<PluginSpec> {
        self.plugins.iter().map(PluginEntry::to_spec).collect()
    }

    /// Configured local folder, or a per-user cache directory
    pub fn local_folder(&self) -> PathBuf {
        self.local_folder.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("ephemeral-cluster")
        })
    }

    /// Runtime configuration for an already parsed version
    pub fn to_configuration(&self, version: StructuredVersion) -> ClusterConfiguration {
        ClusterConfiguration {
            version,
            server_type: self.server_type,
            plugins: self.plugin_specs(),
            enable_ssl: self.enable_ssl,
            cache_home_installation: self.cache_home_installation,
            validate_plugins_before_install: self.validate_plugins_before_install,
            http_port: self.http_port,
        }
    }
}

/// In-memory configuration every cluster task reads
#[derive(Debug, Clone)]
pub struct ClusterConfiguration {
    pub version: StructuredVersion,
    pub server_type: ServerType,
    pub plugins: Vec<PluginSpec>,
    pub enable_ssl: bool,
    pub cache_home_installation: bool,
    pub validate_plugins_before_install: bool,
    pub http_port: u16,
}

impl ClusterConfiguration {
    /// Defaults for `version`: OpenSearch, no plugins, no SSL, no caching
    pub fn new(version: StructuredVersion) -> Self {
        Self {
            version,
            server_type: ServerType::default(),
            plugins: Vec::new(),
            enable_ssl: false,
            cache_home_installation: false,
            validate_plugins_before_install: true,
            http_port: default_http_port(),
        }
    }
}
