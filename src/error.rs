//! Error types for cluster provisioning

use thiserror::Error;

/// Errors raised while resolving versions and artifacts or running cluster tasks
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Malformed version '{0}'")]
    MalformedVersion(String),

    #[error("Unable to resolve artifact for {product} {version}: {reason}")]
    UnresolvableArtifact {
        product: String,
        version: String,
        reason: String,
    },

    #[error("Unsupported configuration: {0}")]
    UnsupportedCombination(String),

    #[error(
        "Not all the running nodes in the cluster are on requested version: {expected} received: {}",
        .received.join(", ")
    )]
    ValidationMismatch {
        expected: String,
        received: Vec<String>,
    },

    #[error("Calling _cat/nodes for version checking did not result in an OK response: {0}")]
    VersionPollFailed(String),

    #[error("Can not install the following plugins for version {version}: {}", .plugins.join(", "))]
    PluginRejected {
        version: String,
        plugins: Vec<String>,
    },

    #[error("Failed to {purpose}: {binary} exited with code {code}")]
    ProcessFailed {
        purpose: String,
        binary: String,
        code: i32,
    },

    #[error("Download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    /// Shorthand for an unresolvable artifact error
    pub fn unresolvable(
        product: impl Into<String>,
        version: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableArtifact {
            product: product.into(),
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}
