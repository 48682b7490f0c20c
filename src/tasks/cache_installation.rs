use super::{ClusterTask, TaskOutcome};
use crate::cluster::{copy_dir_all, EphemeralCluster, CACHE_COMPLETE_MARKER};
use crate::error::ClusterError;
use async_trait::async_trait;
use tracing::info;

/// Keeps a copy of the provisioned home so later runs can skip setup
pub struct CacheInstallation;

#[async_trait]
impl ClusterTask for CacheInstallation {
    fn name(&self) -> &'static str {
        "cache-installation"
    }

    async fn run(&self, cluster: &EphemeralCluster) -> Result<TaskOutcome, ClusterError> {
        if !cluster.configuration.cache_home_installation {
            return Ok(TaskOutcome::skipped("home caching is disabled"));
        }
        // plugin config mirroring may already have created part of the cached
        // home, so only the answer computed at bring-up counts
        if cluster.caching_and_cached_home_exists() {
            return Ok(TaskOutcome::skipped("cached home exists"));
        }

        let home = cluster.file_system.home.clone();
        let cached_home = cluster.cached_home();
        info!("Caching {} as {}", home.display(), cached_home.display());
        tokio::task::spawn_blocking(move || {
            copy_dir_all(&home, &cached_home)?;
            // marker goes last; a partial copy has none
            std::fs::write(cached_home.join(CACHE_COMPLETE_MARKER), b"")
        })
        .await
        .map_err(|e| ClusterError::Io(std::io::Error::other(e)))??;

        Ok(TaskOutcome::Completed)
    }
}
