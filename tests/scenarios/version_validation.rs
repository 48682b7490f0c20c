//! Test: Version validation against the running node

use crate::helpers::*;
use ephemeral_cluster::artifacts::ServerType;
use ephemeral_cluster::error::ClusterError;
use ephemeral_cluster::tasks::{ClusterTask, TaskOutcome, ValidateRunningVersion};

#[tokio::test]
async fn test_all_nodes_on_version() {
    let node = TestNode::new();
    node.http.report_nodes(&["2.4.5", "2.4.5"]);
    let cluster = node.cluster(configuration(ServerType::OpenSearch, released("2.4.5"), vec![]));

    let outcome = ValidateRunningVersion.run(&cluster).await.unwrap();

    assert_eq!(outcome, TaskOutcome::Completed);
    assert_eq!(node.http.poll_count(), 1);
}

#[tokio::test]
async fn test_mismatch_reports_every_line() {
    let node = TestNode::new();
    node.http.report_nodes(&["2.4.5", "2.4.6"]);
    let cluster = node.cluster(configuration(ServerType::OpenSearch, released("2.4.5"), vec![]));

    let err = ValidateRunningVersion.run(&cluster).await.unwrap_err();

    match err {
        ClusterError::ValidationMismatch { expected, received } => {
            assert_eq!(expected, "2.4.5");
            assert_eq!(received, vec!["2.4.5", "2.4.6"]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    // polled once, no retry
    assert_eq!(node.http.poll_count(), 1);
}

#[tokio::test]
async fn test_opendistro_checks_fixed_version() {
    let node = TestNode::new();
    node.http.report_nodes(&["7.10.2"]);
    let cluster = node.cluster(configuration(ServerType::OpenDistro, released("1.13.2"), vec![]));

    assert_eq!(ValidateRunningVersion::expected_version(&cluster), "7.10.2");
    ValidateRunningVersion.run(&cluster).await.unwrap();

    node.http.report_nodes(&["1.13.2"]);
    let err = ValidateRunningVersion.run(&cluster).await.unwrap_err();
    assert!(matches!(err, ClusterError::ValidationMismatch { .. }));
}

/// Pre-release labels are not part of the reported version
#[tokio::test]
async fn test_snapshot_compares_bare_version() {
    let node = TestNode::new();
    node.http.respond(200, "  2.5.0 \r\n2.5.0\n\n");
    let cluster = node.cluster(configuration(
        ServerType::OpenSearch,
        snapshot("2.5.0-SNAPSHOT"),
        vec![],
    ));

    ValidateRunningVersion.run(&cluster).await.unwrap();
}

#[tokio::test]
async fn test_failed_poll() {
    let node = TestNode::new();
    node.http.respond(503, "unavailable");
    let cluster = node.cluster(configuration(ServerType::OpenSearch, released("2.4.5"), vec![]));

    let err = ValidateRunningVersion.run(&cluster).await.unwrap_err();

    assert!(matches!(err, ClusterError::VersionPollFailed(_)));
}
