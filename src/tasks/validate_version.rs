use super::{ClusterTask, TaskOutcome};
use crate::artifacts::ServerType;
use crate::cluster::EphemeralCluster;
use crate::error::ClusterError;
use async_trait::async_trait;
use tracing::{debug, info};

/// Upstream version every OpenDistro node reports
pub const OPENDISTRO_ANCHOR_VERSION: &str = "7.10.2";

/// Checks that every node reports the configured version.
///
/// Polls `_cat/nodes` once; waiting for the node to come up is up to the caller.
pub struct ValidateRunningVersion;

impl ValidateRunningVersion {
    /// The `major.minor.patch` string nodes are expected to report
    pub fn expected_version(cluster: &EphemeralCluster) -> String {
        match cluster.server_type() {
            ServerType::OpenDistro => OPENDISTRO_ANCHOR_VERSION.to_string(),
            _ => cluster.configuration.version.anchor(),
        }
    }
}

#[async_trait]
impl ClusterTask for ValidateRunningVersion {
    fn name(&self) -> &'static str {
        "validate-running-version"
    }

    async fn run(&self, cluster: &EphemeralCluster) -> Result<TaskOutcome, ClusterError> {
        let expected = Self::expected_version(cluster);
        debug!("Validating nodes report {}", expected);

        let response = cluster.http.get("_cat/nodes", &[("h", "version")]).await?;
        if !response.is_success() {
            return Err(ClusterError::VersionPollFailed(format!(
                "_cat/nodes returned HTTP {}",
                response.status
            )));
        }

        let received: Vec<String> = response
            .body
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_string())
            .collect();

        if received.iter().any(|line| *line != expected) {
            return Err(ClusterError::ValidationMismatch { expected, received });
        }

        info!("All {} node(s) report {}", received.len(), expected);
        Ok(TaskOutcome::Completed)
    }
}
