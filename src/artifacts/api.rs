//! HTTP client for the release, snapshot and staging indexes

use crate::error::ClusterError;
use crate::version::{parse_semver, VersionIndex};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Base locations of the three artifact indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEndpoints {
    #[serde(default = "default_releases_url")]
    pub releases_url: String,

    #[serde(default = "default_snapshots_url")]
    pub snapshots_url: String,

    #[serde(default = "default_staging_url")]
    pub staging_url: String,
}

fn default_releases_url() -> String {
    "https://artifacts.opensearch.org/releases".to_string()
}

fn default_snapshots_url() -> String {
    "https://artifacts.opensearch.org/snapshots".to_string()
}

fn default_staging_url() -> String {
    "https://ci.opensearch.org/ci/dbc/distribution-build-opensearch".to_string()
}

impl Default for ArtifactEndpoints {
    fn default() -> Self {
        Self {
            releases_url: default_releases_url(),
            snapshots_url: default_snapshots_url(),
            staging_url: default_staging_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReleaseList {
    releases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VersionList {
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LatestBuild {
    build_hash: String,
}

/// One nightly build of a product
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotBuild {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotBuilds {
    builds: Vec<SnapshotBuild>,
}

/// Artifacts of one staged build candidate: product -> platform -> url
#[derive(Debug, Clone, Deserialize)]
pub struct StagingManifest {
    pub artifacts: HashMap<String, HashMap<String, String>>,
}

/// Client for the artifact index APIs
#[derive(Debug, Clone)]
pub struct ArtifactsApi {
    client: Client,
    endpoints: ArtifactEndpoints,
}

impl ArtifactsApi {
    pub fn new(endpoints: ArtifactEndpoints) -> Result<Self, ClusterError> {
        let client = Client::builder()
            .user_agent(concat!("ephemeral-cluster/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClusterError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &ArtifactEndpoints {
        &self.endpoints
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, subject: &str) -> Result<T, ClusterError> {
        debug!("Querying artifact index {}", url);
        let unresolvable = |reason: String| ClusterError::unresolvable(subject, "-", reason);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unresolvable(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(unresolvable(format!("{} returned HTTP {}", url, response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| unresolvable(format!("unexpected response from {}: {}", url, e)))
    }

    /// Every release listed by the public release index
    pub async fn releases(&self) -> Result<Vec<String>, ClusterError> {
        let url = format!("{}/releases.json", self.endpoints.releases_url);
        let list: ReleaseList = self.get_json(&url, "release index").await?;
        Ok(list.releases)
    }

    /// Every release and snapshot version known to the snapshot index
    pub async fn versions(&self) -> Result<Vec<String>, ClusterError> {
        let url = format!("{}/versions.json", self.endpoints.snapshots_url);
        let list: VersionList = self.get_json(&url, "snapshot index").await?;
        Ok(list.versions)
    }

    /// Nightly builds of `product` at `version`
    pub async fn snapshot_builds(
        &self,
        product: &str,
        version: &str,
    ) -> Result<Vec<SnapshotBuild>, ClusterError> {
        let url = format!("{}/{}/{}/builds.json", self.endpoints.snapshots_url, product, version);
        let builds: SnapshotBuilds = self.get_json(&url, product).await?;
        Ok(builds.builds)
    }

    /// Artifact manifest of the build candidate `build_hash` of `version`
    pub async fn staging_manifest(
        &self,
        version: &str,
        build_hash: &str,
    ) -> Result<StagingManifest, ClusterError> {
        let url = format!(
            "{}/{}/{}/manifest.json",
            self.endpoints.staging_url, version, build_hash
        );
        self.get_json(&url, "staging index").await
    }

    /// Pick the highest semantic version, optionally restricted to one major
    fn newest(versions: &[String], major: Option<u64>) -> Option<String> {
        versions
            .iter()
            .filter_map(|raw| parse_semver(raw).ok().map(|parsed| (parsed, raw)))
            .filter(|(parsed, _)| major.map_or(true, |m| parsed.major == m))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, raw)| raw.clone())
    }
}

#[async_trait]
impl VersionIndex for ArtifactsApi {
    async fn is_released(&self, version: &str) -> Result<bool, ClusterError> {
        Ok(self.releases().await?.iter().any(|r| r == version))
    }

    async fn latest_release_or_snapshot(&self) -> Result<String, ClusterError> {
        let versions = self.versions().await?;
        Self::newest(&versions, None)
            .ok_or_else(|| ClusterError::unresolvable("snapshot index", "latest", "no versions listed"))
    }

    async fn latest_for_major(&self, major: u64) -> Result<String, ClusterError> {
        let versions = self.versions().await?;
        Self::newest(&versions, Some(major)).ok_or_else(|| {
            ClusterError::unresolvable(
                "snapshot index",
                format!("latest-{}", major),
                "no versions listed for this major",
            )
        })
    }

    async fn latest_build_hash(&self, version: &str) -> Result<String, ClusterError> {
        let url = format!("{}/{}/latest.json", self.endpoints.staging_url, version);
        let latest: LatestBuild = self.get_json(&url, "staging index").await?;
        Ok(latest.build_hash)
    }
}
