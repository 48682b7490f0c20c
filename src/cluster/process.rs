//! External process execution

use crate::error::ClusterError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

/// A single blocking invocation of an external binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    /// Executable to run
    pub binary: PathBuf,
    /// Human readable purpose, used in logs and errors
    pub purpose: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

/// Runs installer binaries and scripts to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation, failing on a non-zero exit status
    async fn execute(&self, invocation: &ProcessInvocation) -> Result<(), ClusterError>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn execute(&self, invocation: &ProcessInvocation) -> Result<(), ClusterError> {
        debug!(
            "Running {} to {}: {:?}",
            invocation.binary.display(),
            invocation.purpose,
            invocation.args
        );

        let mut command = Command::new(&invocation.binary);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("[{}] {}", invocation.purpose, line);
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(
                "{} exited with code {}: {}",
                invocation.binary.display(),
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(ClusterError::ProcessFailed {
                purpose: invocation.purpose.clone(),
                binary: invocation.binary.display().to_string(),
                code,
            });
        }

        Ok(())
    }
}
