//! Cluster setup tasks and the pipeline that runs them
//!
//! Every task implements [`ClusterTask`]; a [`TaskPipeline`] is an ordered
//! list of them. Tasks keep no state of their own: everything lives in the
//! [`EphemeralCluster`] context and on disk.

pub mod cache_installation;
pub mod initial_configuration;
pub mod install_plugins;
pub mod pipeline;
pub mod restore_cached_home;
pub mod scripts;
pub mod validate_version;

use crate::cluster::EphemeralCluster;
use crate::error::ClusterError;
use async_trait::async_trait;

pub use cache_installation::CacheInstallation;
pub use initial_configuration::InitialConfiguration;
pub use install_plugins::InstallPlugins;
pub use pipeline::{
    ClusterComposer, EventHandler, ExecutionStatus, NodeLauncher, PipelineEvent, PipelineRun, TaskPipeline,
    TaskReport, TaskState,
};
pub use restore_cached_home::RestoreCachedHome;
pub use validate_version::ValidateRunningVersion;

/// What a task did when it returned successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task changed the node
    Completed,
    /// Nothing to do; not an error
    Skipped { reason: String },
}

impl TaskOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        TaskOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

/// A single setup or validation step
#[async_trait]
pub trait ClusterTask: Send + Sync {
    /// Name used in logs and events
    fn name(&self) -> &'static str;

    async fn run(&self, cluster: &EphemeralCluster) -> Result<TaskOutcome, ClusterError>;
}
