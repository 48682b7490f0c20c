use super::{ClusterTask, TaskOutcome};
use crate::cluster::{overwrite_dir_all, EphemeralCluster, CACHE_COMPLETE_MARKER};
use crate::error::ClusterError;
use async_trait::async_trait;
use tracing::info;

/// Copies a previously cached home into the node home
pub struct RestoreCachedHome;

#[async_trait]
impl ClusterTask for RestoreCachedHome {
    fn name(&self) -> &'static str {
        "restore-cached-home"
    }

    async fn run(&self, cluster: &EphemeralCluster) -> Result<TaskOutcome, ClusterError> {
        if !cluster.caching_and_cached_home_exists() {
            return Ok(TaskOutcome::skipped("no cached home"));
        }

        let cached_home = cluster.cached_home();
        let home = cluster.file_system.home.clone();
        info!("Restoring {} from {}", home.display(), cached_home.display());
        tokio::task::spawn_blocking(move || {
            overwrite_dir_all(&cached_home, &home)?;
            let marker = home.join(CACHE_COMPLETE_MARKER);
            if marker.exists() {
                std::fs::remove_file(marker)?;
            }
            Ok::<_, std::io::Error>(())
        })
        .await
        .map_err(|e| ClusterError::Io(std::io::Error::other(e)))??;

        Ok(TaskOutcome::Completed)
    }
}
