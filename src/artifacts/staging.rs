//! Internal build candidates

use super::snapshot::ANY_PLATFORM;
use super::{ArtifactDescriptor, ArtifactsApi, Platform, ProvenanceStrategy, Product};
use crate::error::ClusterError;
use crate::version::{StructuredVersion, VersionIndex};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Looks build candidates up in the staging index by build hash
#[derive(Debug, Clone)]
pub struct StagingStrategy {
    api: Arc<ArtifactsApi>,
}

impl StagingStrategy {
    pub fn new(api: Arc<ArtifactsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProvenanceStrategy for StagingStrategy {
    async fn resolve(
        &self,
        product: &Product,
        version: &StructuredVersion,
        platform: Platform,
    ) -> Result<ArtifactDescriptor, ClusterError> {
        let id = product.id();
        let raw_version = version.to_string();

        let build_hash = match version.build_hash() {
            Some(hash) => hash.to_string(),
            None => {
                let hash = self.api.latest_build_hash(&raw_version).await?;
                debug!("Using newest build candidate {} of {}", hash, raw_version);
                hash
            }
        };

        let manifest = self
            .api
            .staging_manifest(&raw_version, &build_hash)
            .await
            .map_err(|e| ClusterError::unresolvable(&id, version, e.to_string()))?;

        let moniker = platform.moniker();
        let url = manifest
            .artifacts
            .get(&id)
            .and_then(|builds| builds.get(&moniker).or_else(|| builds.get(ANY_PLATFORM)))
            .ok_or_else(|| {
                ClusterError::unresolvable(
                    &id,
                    version,
                    format!("build {} has no artifact for platform {}", build_hash, moniker),
                )
            })?;

        Ok(ArtifactDescriptor::for_product(product, version, platform, url.clone()))
    }
}
