use super::{ClusterTask, TaskOutcome};
use crate::artifacts::{PluginSpec, Product};
use crate::cluster::{copy_dir_all, EphemeralCluster};
use crate::error::ClusterError;
use async_trait::async_trait;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Installs the configured plugins with the family's plugin binary
pub struct InstallPlugins;

#[async_trait]
impl ClusterTask for InstallPlugins {
    fn name(&self) -> &'static str {
        "install-plugins"
    }

    async fn run(&self, cluster: &EphemeralCluster) -> Result<TaskOutcome, ClusterError> {
        if cluster.caching_and_cached_home_exists() {
            return Ok(TaskOutcome::skipped("cached home exists"));
        }

        let configuration = &cluster.configuration;
        let version = &configuration.version;

        if configuration.validate_plugins_before_install {
            let invalid: Vec<String> = configuration
                .plugins
                .iter()
                .filter(|p| !p.is_valid_for(version))
                .map(|p| p.name.clone())
                .collect();
            if !invalid.is_empty() {
                return Err(ClusterError::PluginRejected {
                    version: version.to_string(),
                    plugins: invalid,
                });
            }
        }

        let mut installed = 0;
        for plugin in &configuration.plugins {
            if plugin.is_shipped_out_of_box(version) {
                info!("{} is shipped out of the box as of {}, skipping", plugin.name, version);
                continue;
            }
            if !plugin.is_valid_for(version) {
                info!(
                    "{} is not valid for {} (range {}), skipping",
                    plugin.name, version, plugin.valid_range
                );
                continue;
            }
            if cluster.file_system.plugins_path().join(&plugin.name).exists() {
                info!("{} is already installed, skipping", plugin.name);
                continue;
            }

            install_plugin(cluster, plugin).await?;
            installed += 1;
        }

        if installed == 0 {
            return Ok(TaskOutcome::skipped("no plugins to install"));
        }
        Ok(TaskOutcome::Completed)
    }
}

async fn install_plugin(cluster: &EphemeralCluster, plugin: &PluginSpec) -> Result<(), ClusterError> {
    let version = &cluster.configuration.version;
    let file_system = &cluster.file_system;

    let archive = download_plugin(cluster, plugin).await?;
    let uri = Url::from_file_path(&archive).map_err(|_| {
        ClusterError::Config(format!(
            "Plugin archive path is not absolute: {}",
            archive.display()
        ))
    })?;

    if !file_system.config_path.exists() {
        tokio::fs::create_dir_all(&file_system.config_path).await?;
    }

    let invocation = cluster.invocation(
        &file_system.plugin_binary,
        format!("install {} plugin", plugin.name),
        vec!["install".to_string(), "--batch".to_string(), uri.to_string()],
    );
    cluster.process.execute(&invocation).await?;
    info!("Installed {} {}", plugin.name, version);

    if cluster.configuration.cache_home_installation {
        mirror_plugin_config(
            &file_system.config_path.join(&plugin.name),
            &cluster.cached_home().join("config").join(&plugin.name),
        )?;
    }
    Ok(())
}

/// Download the plugin archive unless an earlier run left it on disk
async fn download_plugin(
    cluster: &EphemeralCluster,
    plugin: &PluginSpec,
) -> Result<PathBuf, ClusterError> {
    let version = &cluster.configuration.version;
    let local_folder = &cluster.file_system.local_folder;
    let archive = local_folder.join(format!("{}-{}.zip", plugin.name, version));
    if archive.exists() {
        debug!("Reusing {}", archive.display());
        return Ok(archive);
    }

    let descriptor = version
        .artifact(&Product::Plugin(plugin.clone()), &cluster.resolver)
        .await?;
    tokio::fs::create_dir_all(local_folder).await?;

    info!("Downloading {} from {}", plugin.name, descriptor.download_url);
    if let Err(e) = cluster.http.download(&descriptor.download_url, &archive).await {
        warn!("Failed to download {}: {}", plugin.name, e);
        return Err(e);
    }
    Ok(archive)
}

/// Copy a plugin's generated config into the cached home, never over an existing copy
fn mirror_plugin_config(source: &Path, target: &Path) -> Result<(), ClusterError> {
    if !source.is_dir() || target.exists() {
        return Ok(());
    }
    debug!("Mirroring {} to {}", source.display(), target.display());
    copy_dir_all(source, target)?;
    Ok(())
}
