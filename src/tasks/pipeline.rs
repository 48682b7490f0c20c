//! Ordered task execution

use super::{
    CacheInstallation, ClusterTask, InitialConfiguration, InstallPlugins, RestoreCachedHome,
    TaskOutcome, ValidateRunningVersion,
};
use crate::cluster::EphemeralCluster;
use crate::error::ClusterError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Overall status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Completed,
    Failed,
}

/// Result of one task that finished without error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskState {
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task: String,
    pub state: TaskState,
}

/// Reports of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub execution_id: Uuid,
    pub pipeline: String,
    pub status: ExecutionStatus,
    pub reports: Vec<TaskReport>,
}

/// Events that can occur during a pipeline run
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline: String,
    },
    TaskStarted {
        task: String,
    },
    TaskCompleted {
        task: String,
    },
    TaskSkipped {
        task: String,
        reason: String,
    },
    TaskFailed {
        task: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Runs tasks in a fixed order, stopping at the first failure
#[derive(Clone)]
pub struct TaskPipeline {
    name: String,
    tasks: Vec<Arc<dyn ClusterTask>>,
    event_handlers: Vec<EventHandler>,
}

impl TaskPipeline {
    pub fn new(name: impl Into<String>, tasks: Vec<Arc<dyn ClusterTask>>) -> Self {
        Self {
            name: name.into(),
            tasks,
            event_handlers: Vec::new(),
        }
    }

    /// Cached home restore, configuration, plugins, then caching of the
    /// provisioned home
    pub fn installation() -> Self {
        Self::new(
            "installation",
            vec![
                Arc::new(RestoreCachedHome),
                Arc::new(InitialConfiguration),
                Arc::new(InstallPlugins),
                Arc::new(CacheInstallation),
            ],
        )
    }

    /// Checks run against a started node
    pub fn validation() -> Self {
        Self::new("validation", vec![Arc::new(ValidateRunningVersion)])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: PipelineEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run every task in order.
    ///
    /// The first error is returned unchanged; later tasks do not run and
    /// whatever the earlier tasks left on disk stays there.
    pub async fn run(&self, cluster: &EphemeralCluster) -> Result<PipelineRun, ClusterError> {
        let execution_id = Uuid::new_v4();
        info!("Starting {} pipeline ({})", self.name, execution_id);
        self.emit_event(PipelineEvent::PipelineStarted {
            execution_id,
            pipeline: self.name.clone(),
        });

        let mut reports = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            let name = task.name().to_string();
            self.emit_event(PipelineEvent::TaskStarted { task: name.clone() });
            let started_at = Utc::now();

            let state = match task.run(cluster).await {
                Ok(TaskOutcome::Completed) => {
                    self.emit_event(PipelineEvent::TaskCompleted { task: name.clone() });
                    TaskState::Completed {
                        started_at,
                        completed_at: Utc::now(),
                    }
                }
                Ok(TaskOutcome::Skipped { reason }) => {
                    info!("Skipped {}: {}", name, reason);
                    self.emit_event(PipelineEvent::TaskSkipped {
                        task: name.clone(),
                        reason: reason.clone(),
                    });
                    TaskState::Skipped { reason }
                }
                Err(e) => {
                    error!("Task {} failed: {}", name, e);
                    self.emit_event(PipelineEvent::TaskFailed {
                        task: name,
                        error: e.to_string(),
                    });
                    self.emit_event(PipelineEvent::PipelineCompleted {
                        execution_id,
                        status: ExecutionStatus::Failed,
                    });
                    return Err(e);
                }
            };
            reports.push(TaskReport { task: name, state });
        }

        info!("Finished {} pipeline ({})", self.name, execution_id);
        self.emit_event(PipelineEvent::PipelineCompleted {
            execution_id,
            status: ExecutionStatus::Completed,
        });

        Ok(PipelineRun {
            execution_id,
            pipeline: self.name.clone(),
            status: ExecutionStatus::Completed,
            reports,
        })
    }
}

/// Starts the node process between installation and validation
#[async_trait]
pub trait NodeLauncher: Send + Sync {
    async fn start(&self, cluster: &EphemeralCluster) -> Result<(), ClusterError>;
}

/// Brings a node up: installation tasks, node start, validation tasks
#[derive(Clone)]
pub struct ClusterComposer {
    installation: TaskPipeline,
    validation: TaskPipeline,
}

impl ClusterComposer {
    pub fn new(installation: TaskPipeline, validation: TaskPipeline) -> Self {
        Self {
            installation,
            validation,
        }
    }

    pub fn standard() -> Self {
        Self::new(TaskPipeline::installation(), TaskPipeline::validation())
    }

    /// Add an event handler to both pipelines
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        let forward = Arc::clone(&handler);
        self.installation.add_event_handler(move |event| forward(event));
        self.validation.add_event_handler(move |event| handler(event));
    }

    pub async fn bring_up(
        &self,
        cluster: &EphemeralCluster,
        launcher: &dyn NodeLauncher,
    ) -> Result<Vec<PipelineRun>, ClusterError> {
        let installed = self.installation.run(cluster).await?;
        info!("Starting node at {}", cluster.file_system.home.display());
        launcher.start(cluster).await?;
        let validated = self.validation.run(cluster).await?;
        Ok(vec![installed, validated])
    }
}
