//! The cluster context every task runs against

pub mod config;
pub mod filesystem;
pub mod http;
pub mod process;

use crate::artifacts::{ArtifactResolver, ServerType};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub use config::{ClusterConfig, ClusterConfiguration, PluginEntry};
pub use filesystem::{copy_dir_all, overwrite_dir_all, NodeFileSystem};
pub use http::{HttpClient, HttpResponse, ReqwestHttp};
pub use process::{CommandRunner, ProcessInvocation, ProcessRunner};

/// Password handed to the security demo configuration on versions that require one
pub const DEMO_ADMIN_PASSWORD: &str = "myStrongPassword123!";

/// Written into a cached home once it holds a fully provisioned copy
pub const CACHE_COMPLETE_MARKER: &str = ".cache-complete";

/// Configuration, paths and collaborators of one ephemeral node
#[derive(Clone)]
pub struct EphemeralCluster {
    pub configuration: ClusterConfiguration,
    pub file_system: NodeFileSystem,
    pub resolver: ArtifactResolver,
    pub process: Arc<dyn ProcessRunner>,
    pub http: Arc<dyn HttpClient>,
    cached_home_exists: bool,
}

impl EphemeralCluster {
    /// Assemble the context. Whether a cached home exists is decided here,
    /// once, and every task consults that answer. A cached home without its
    /// completion marker does not count.
    pub fn new(
        configuration: ClusterConfiguration,
        file_system: NodeFileSystem,
        resolver: ArtifactResolver,
        process: Arc<dyn ProcessRunner>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let cached_home = file_system
            .local_folder
            .join(cache_folder_name(&configuration));
        let cached_home_exists = configuration.cache_home_installation
            && cached_home.join(CACHE_COMPLETE_MARKER).is_file();
        debug!(
            "Cached home {} exists: {}",
            cached_home.display(),
            cached_home_exists
        );

        Self {
            configuration,
            file_system,
            resolver,
            process,
            http,
            cached_home_exists,
        }
    }

    /// Caching is on and a provisioned home for this exact configuration exists
    pub fn caching_and_cached_home_exists(&self) -> bool {
        self.cached_home_exists
    }

    pub fn cache_folder_name(&self) -> String {
        cache_folder_name(&self.configuration)
    }

    /// Location of the cached home for this configuration
    pub fn cached_home(&self) -> PathBuf {
        self.file_system.local_folder.join(self.cache_folder_name())
    }

    pub fn server_type(&self) -> ServerType {
        self.configuration.server_type
    }

    /// Build an invocation with the node's environment
    pub fn invocation(
        &self,
        binary: impl AsRef<Path>,
        purpose: impl Into<String>,
        args: Vec<String>,
    ) -> ProcessInvocation {
        let server_type = self.server_type();
        ProcessInvocation {
            binary: binary.as_ref().to_path_buf(),
            purpose: purpose.into(),
            args,
            env: vec![
                (
                    server_type.path_conf_env().to_string(),
                    self.file_system.config_path.display().to_string(),
                ),
                (
                    "OPENSEARCH_INITIAL_ADMIN_PASSWORD".to_string(),
                    DEMO_ADMIN_PASSWORD.to_string(),
                ),
            ],
            working_dir: Some(self.file_system.home.clone()),
        }
    }
}

/// Fingerprint of everything that shapes a provisioned home
fn cache_folder_name(configuration: &ClusterConfiguration) -> String {
    let mut plugins: Vec<&str> = configuration.plugins.iter().map(|p| p.name.as_str()).collect();
    plugins.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(configuration.server_type.product_id());
    hasher.update(configuration.version.to_string());
    hasher.update(plugins.join(","));
    hasher.update(if configuration.enable_ssl { "ssl" } else { "plain" });
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}-{}-{}",
        configuration.server_type.product_id(),
        configuration.version,
        &digest[..12]
    )
}
