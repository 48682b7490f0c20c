//! Nightly snapshot builds

use super::{ArtifactDescriptor, ArtifactsApi, Platform, ProvenanceStrategy, Product};
use crate::error::ClusterError;
use crate::version::StructuredVersion;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Platform label of builds that run anywhere, e.g. plugin zips
pub(crate) const ANY_PLATFORM: &str = "any";

/// Queries the snapshot API for the closest build of a product
#[derive(Debug, Clone)]
pub struct SnapshotStrategy {
    api: Arc<ArtifactsApi>,
}

impl SnapshotStrategy {
    pub fn new(api: Arc<ArtifactsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProvenanceStrategy for SnapshotStrategy {
    async fn resolve(
        &self,
        product: &Product,
        version: &StructuredVersion,
        platform: Platform,
    ) -> Result<ArtifactDescriptor, ClusterError> {
        let id = product.id();
        let builds = self
            .api
            .snapshot_builds(&id, &version.to_string())
            .await
            .map_err(|e| ClusterError::unresolvable(&id, version, e.to_string()))?;
        debug!("Snapshot index lists {} builds of {} {}", builds.len(), id, version);

        let moniker = platform.moniker();
        let build = builds
            .iter()
            .find(|b| b.platform == moniker)
            .or_else(|| builds.iter().find(|b| b.platform == ANY_PLATFORM))
            .ok_or_else(|| {
                ClusterError::unresolvable(
                    &id,
                    version,
                    format!("no snapshot build for platform {}", moniker),
                )
            })?;

        Ok(ArtifactDescriptor::for_product(product, version, platform, build.url.clone()))
    }
}
