use super::scripts::{initial_configuration_script, INITIAL_CONFIG_SCRIPT};
use super::{ClusterTask, TaskOutcome};
use crate::artifacts::ServerType;
use crate::cluster::EphemeralCluster;
use crate::error::ClusterError;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Runs the family's demo security setup and, without SSL, disables security
pub struct InitialConfiguration;

#[async_trait]
impl ClusterTask for InitialConfiguration {
    fn name(&self) -> &'static str {
        "initial-configuration"
    }

    async fn run(&self, cluster: &EphemeralCluster) -> Result<TaskOutcome, ClusterError> {
        if cluster.caching_and_cached_home_exists() {
            return Ok(TaskOutcome::skipped("cached home exists"));
        }

        let configuration = &cluster.configuration;
        let server_type = configuration.server_type;
        if server_type == ServerType::ElasticSearch && configuration.enable_ssl {
            return Err(ClusterError::UnsupportedCombination(
                "ElasticSearch with SSL is not supported".to_string(),
            ));
        }

        let Some(script) = initial_configuration_script(server_type, &configuration.version) else {
            return Ok(TaskOutcome::skipped(format!(
                "no initial configuration for {}",
                server_type
            )));
        };

        let home = &cluster.file_system.home;
        let script_path = home.join(INITIAL_CONFIG_SCRIPT);
        tokio::fs::write(&script_path, script).await?;
        info!("Running {}", script_path.display());

        let invocation = cluster.invocation(
            "/bin/bash",
            "run initial cluster configuration",
            vec![script_path.display().to_string()],
        );
        cluster.process.execute(&invocation).await?;

        if !configuration.enable_ssl {
            if let Some(directive) = server_type.security_disable_directive() {
                let config_file = home.join("config").join(server_type.main_config_file());
                append_line(&config_file, directive).await?;
                debug!("Appended '{}' to {}", directive, config_file.display());
            }
        }

        Ok(TaskOutcome::Completed)
    }
}

/// Append `line` on a line of its own
async fn append_line(path: &std::path::Path, line: &str) -> Result<(), ClusterError> {
    let needs_newline = match tokio::fs::read(path).await {
        Ok(existing) => existing.last().is_some_and(|b| *b != b'\n'),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut content = String::new();
    if needs_newline {
        content.push('\n');
    }
    content.push_str(line);
    content.push('\n');
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
