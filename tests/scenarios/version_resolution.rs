//! Test: Version parsing and memoized artifact resolution

use crate::helpers::*;
use ephemeral_cluster::artifacts::{PluginSpec, Product, ResolutionCache, ServerType};
use ephemeral_cluster::version::{parse, Provenance, StructuredVersion};
use std::sync::Arc;

/// `latest-N` resolves to a string that re-parses to the same provenance
#[tokio::test]
async fn test_latest_round_trip() {
    let cases = [
        ("5.1.0", Provenance::Released),
        ("5.2.0-SNAPSHOT", Provenance::Snapshot),
        ("5.3.0", Provenance::BuildCandidate),
    ];

    for (resolved, provenance) in cases {
        let index = StubIndex::new(&["5.1.0"]).with_latest_for_major(resolved);

        let latest = parse("latest-5", &index).await.unwrap().unwrap();
        assert_eq!(latest.provenance(), provenance, "latest-5 -> {}", resolved);

        let direct = parse(&latest.to_string(), &index).await.unwrap().unwrap();
        assert_eq!(direct.provenance(), latest.provenance(), "re-parsing {}", latest);
        assert_eq!(direct, latest);
    }
}

#[tokio::test]
async fn test_latest_build_candidate_carries_hash() {
    let index = StubIndex::new(&[]).with_latest_for_major("5.3.0");

    let version = parse("latest-5", &index).await.unwrap().unwrap();

    assert_eq!(version.provenance(), Provenance::BuildCandidate);
    assert_eq!(version.build_hash(), Some("f00ba4"));
}

/// Concurrent callers on one version instance observe one descriptor
#[tokio::test]
async fn test_concurrent_resolution_shares_descriptor() {
    let strategies = CountingResolver::new();
    let resolver = strategies.resolver();
    let version = released("2.4.5");
    let product = Product::Server(ServerType::OpenSearch);

    let (a, b) = tokio::join!(
        version.artifact(&product, &resolver),
        version.artifact(&product, &resolver)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert!((1..=2).contains(&strategies.released.calls()));

    let c = version.artifact(&product, &resolver).await.unwrap();
    assert!(Arc::ptr_eq(&a, &c));
    assert!(strategies.released.calls() <= 2);
}

#[tokio::test]
async fn test_resolution_keyed_by_product() {
    let strategies = CountingResolver::new();
    let resolver = strategies.resolver();
    let version =
        StructuredVersion::new("2.5.0", Provenance::BuildCandidate, Some("abc123".into())).unwrap();

    let server = version
        .artifact(&Product::Server(ServerType::OpenSearch), &resolver)
        .await
        .unwrap();
    let plugin = version
        .artifact(&Product::Plugin(PluginSpec::new("analysis-icu")), &resolver)
        .await
        .unwrap();

    assert_eq!(server.download_url, "https://staging.test/opensearch-2.5.0.zip");
    assert_eq!(plugin.download_url, "https://staging.test/analysis-icu-2.5.0.zip");
    assert_eq!(strategies.staging.calls(), 2);
    assert_eq!(version.cache().len(), 2);
}

/// A bypassed cache resolves on every call
#[tokio::test]
async fn test_bypassed_cache() {
    let strategies = CountingResolver::new();
    let resolver = strategies.resolver();
    let version = snapshot("2.5.0-SNAPSHOT").with_cache(ResolutionCache::bypass());
    let product = Product::Server(ServerType::OpenSearch);

    version.artifact(&product, &resolver).await.unwrap();
    version.artifact(&product, &resolver).await.unwrap();

    assert_eq!(strategies.snapshot.calls(), 2);
}
