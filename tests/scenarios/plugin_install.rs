//! Test: Plugin installation - validation modes, skips and idempotence

use crate::helpers::*;
use ephemeral_cluster::artifacts::{PluginSpec, ServerType};
use ephemeral_cluster::error::ClusterError;
use ephemeral_cluster::tasks::{ClusterTask, InstallPlugins, TaskOutcome};

fn plugins() -> Vec<PluginSpec> {
    vec![
        PluginSpec::new("analysis-icu"),
        PluginSpec::new("legacy-plugin").with_range("<2.0.0"),
        PluginSpec::new("repository-s3").with_range(">=2.0.0 <3.0.0"),
    ]
}

/// Pre-validation rejects the whole batch before anything is fetched
#[tokio::test]
async fn test_prevalidation_rejects_batch() {
    let node = TestNode::new();
    let mut plugins = plugins();
    plugins.push(PluginSpec::new("other-legacy").with_range("<1.5.0"));
    let cluster = node.cluster(configuration(ServerType::OpenSearch, released("2.4.5"), plugins));

    let err = InstallPlugins.run(&cluster).await.unwrap_err();

    match err {
        ClusterError::PluginRejected { version, plugins } => {
            assert_eq!(version, "2.4.5");
            assert_eq!(plugins, vec!["legacy-plugin", "other-legacy"]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(node.http.download_count(), 0);
    assert_eq!(node.process.count(), 0);
    assert_eq!(node.strategies.released.calls(), 0);
}

/// Without pre-validation only the failing plugin is skipped
#[tokio::test]
async fn test_without_prevalidation_skips_invalid_only() {
    let node = TestNode::new();
    let mut configuration = configuration(ServerType::OpenSearch, released("2.4.5"), plugins());
    configuration.validate_plugins_before_install = false;
    let cluster = node.cluster(configuration);

    let outcome = InstallPlugins.run(&cluster).await.unwrap();

    assert_eq!(outcome, TaskOutcome::Completed);
    assert_eq!(node.process.installed_plugins(), vec!["analysis-icu", "repository-s3"]);
    assert_eq!(node.http.download_count(), 2);
    assert!(node.home().join("plugins/analysis-icu").is_dir());
    assert!(!node.home().join("plugins/legacy-plugin").exists());
}

/// Installer receives a file URI to the downloaded archive
#[tokio::test]
async fn test_installer_invocation() {
    let node = TestNode::new();
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        released("2.4.5"),
        vec![PluginSpec::new("analysis-icu")],
    ));

    InstallPlugins.run(&cluster).await.unwrap();

    let invocations = node.process.invocations();
    assert_eq!(invocations.len(), 1);
    let invocation = &invocations[0];
    assert_eq!(invocation.binary, node.home().join("bin/opensearch-plugin"));
    assert_eq!(invocation.args[..2], ["install".to_string(), "--batch".to_string()]);
    assert!(invocation.args[2].starts_with("file://"));
    assert!(invocation.args[2].ends_with("analysis-icu-2.4.5.zip"));
    assert!(invocation
        .env
        .iter()
        .any(|(key, _)| key == "OPENSEARCH_PATH_CONF"));
    assert_eq!(
        node.http.downloaded_urls(),
        vec!["https://releases.test/analysis-icu-2.4.5.zip"]
    );
}

/// A second run over a provisioned home does nothing
#[tokio::test]
async fn test_second_run_is_idempotent() {
    let node = TestNode::new();
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        released("2.4.5"),
        vec![PluginSpec::new("analysis-icu"), PluginSpec::new("mapper-size")],
    ));

    InstallPlugins.run(&cluster).await.unwrap();
    let downloads = node.http.download_count();
    let installs = node.process.count();

    let outcome = InstallPlugins.run(&cluster).await.unwrap();

    assert!(matches!(outcome, TaskOutcome::Skipped { .. }));
    assert_eq!(node.http.download_count(), downloads);
    assert_eq!(node.process.count(), installs);
}

/// Plugins bundled with the server are never installed
#[tokio::test]
async fn test_out_of_box_plugin_skipped() {
    let node = TestNode::new();
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        released("2.4.5"),
        vec![PluginSpec::new("bundled").shipped_as_of("2.0.0")],
    ));

    let outcome = InstallPlugins.run(&cluster).await.unwrap();

    assert!(matches!(outcome, TaskOutcome::Skipped { .. }));
    assert_eq!(node.http.download_count(), 0);
    assert_eq!(node.process.count(), 0);
}

/// An archive left by an earlier run is installed without downloading again
#[tokio::test]
async fn test_existing_archive_reused() {
    let node = TestNode::new();
    std::fs::write(node.local_folder().join("analysis-icu-2.4.5.zip"), b"PK").unwrap();
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        released("2.4.5"),
        vec![PluginSpec::new("analysis-icu")],
    ));

    InstallPlugins.run(&cluster).await.unwrap();

    assert_eq!(node.http.download_count(), 0);
    assert_eq!(node.strategies.released.calls(), 0);
    assert_eq!(node.process.installed_plugins(), vec!["analysis-icu"]);
}

/// A failed download aborts the step before the installer runs
#[tokio::test]
async fn test_download_failure_is_fatal() {
    let node = TestNode::with_collaborators(RecordingProcessRunner::new, MockHttp::failing_downloads());
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        released("2.4.5"),
        vec![PluginSpec::new("analysis-icu"), PluginSpec::new("mapper-size")],
    ));

    let err = InstallPlugins.run(&cluster).await.unwrap_err();

    assert!(matches!(err, ClusterError::DownloadFailed { .. }));
    assert_eq!(node.http.download_count(), 1);
    assert_eq!(node.process.count(), 0);
}

/// Snapshot plugins resolve through the snapshot strategy
#[tokio::test]
async fn test_snapshot_plugin_resolution() {
    let node = TestNode::new();
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        snapshot("2.5.0-SNAPSHOT"),
        vec![PluginSpec::new("analysis-icu").with_range(">=2.0.0")],
    ));

    InstallPlugins.run(&cluster).await.unwrap();

    assert_eq!(node.strategies.snapshot.calls(), 1);
    assert_eq!(node.strategies.released.calls(), 0);
    assert_eq!(
        node.http.downloaded_urls(),
        vec!["https://snapshots.test/analysis-icu-2.5.0-SNAPSHOT.zip"]
    );
}

/// With caching on, generated plugin config is mirrored into the cached home
#[tokio::test]
async fn test_plugin_config_mirrored_into_cache() {
    let node = TestNode::with_collaborators(
        |home| RecordingProcessRunner::new(home).with_plugin_config(),
        MockHttp::new(),
    );
    let mut configuration = configuration(
        ServerType::OpenSearch,
        released("2.4.5"),
        vec![PluginSpec::new("analysis-icu")],
    );
    configuration.cache_home_installation = true;
    let cluster = node.cluster(configuration);

    InstallPlugins.run(&cluster).await.unwrap();

    let mirrored = cluster.cached_home().join("config/analysis-icu/plugin.yml");
    assert_eq!(std::fs::read_to_string(mirrored).unwrap(), "name: analysis-icu\n");
}
