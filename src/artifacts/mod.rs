//! Artifact resolution
//!
//! Resolution dispatches on a version's [`Provenance`] to one of three
//! strategies: templated public release URLs, the nightly snapshot API, or
//! the internal staging index for build candidates.

pub mod api;
pub mod cache;
pub mod platform;
pub mod products;
pub mod released;
pub mod snapshot;
pub mod staging;

use crate::error::ClusterError;
use crate::version::{Provenance, StructuredVersion};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub use api::{ArtifactEndpoints, ArtifactsApi};
pub use cache::ResolutionCache;
pub use platform::{Arch, Os, Platform};
pub use products::{PluginSpec, Product, ServerType};
pub use released::ReleasedStrategy;
pub use snapshot::SnapshotStrategy;
pub use staging::StagingStrategy;

/// A directly fetchable build of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub product: String,
    pub version: String,
    pub platform: Platform,
    pub download_url: String,
    pub included_out_of_box: bool,
    pub shipped_as_of: Option<String>,
}

impl ArtifactDescriptor {
    /// Build a descriptor, deriving the out-of-box fields from the product
    pub fn for_product(
        product: &Product,
        version: &StructuredVersion,
        platform: Platform,
        download_url: impl Into<String>,
    ) -> Self {
        let plugin = product.as_plugin();
        Self {
            product: product.id(),
            version: version.to_string(),
            platform,
            download_url: download_url.into(),
            included_out_of_box: plugin.is_some_and(|p| p.is_shipped_out_of_box(version)),
            shipped_as_of: plugin.and_then(|p| p.shipped_out_of_box_as_of.clone()),
        }
    }
}

/// Resolves artifacts published through one provenance pipeline
#[async_trait]
pub trait ProvenanceStrategy: Send + Sync {
    async fn resolve(
        &self,
        product: &Product,
        version: &StructuredVersion,
        platform: Platform,
    ) -> Result<ArtifactDescriptor, ClusterError>;
}

/// Selects the provenance strategy for a version and resolves through it
#[derive(Clone)]
pub struct ArtifactResolver {
    released: Arc<dyn ProvenanceStrategy>,
    snapshot: Arc<dyn ProvenanceStrategy>,
    staging: Arc<dyn ProvenanceStrategy>,
    platform: Platform,
}

impl ArtifactResolver {
    pub fn new(
        released: Arc<dyn ProvenanceStrategy>,
        snapshot: Arc<dyn ProvenanceStrategy>,
        staging: Arc<dyn ProvenanceStrategy>,
        platform: Platform,
    ) -> Self {
        Self {
            released,
            snapshot,
            staging,
            platform,
        }
    }

    /// Resolver backed by the HTTP artifact indexes, for the current platform
    pub fn from_api(api: Arc<ArtifactsApi>) -> Self {
        Self::new(
            Arc::new(ReleasedStrategy::new(api.endpoints().releases_url.clone())),
            Arc::new(SnapshotStrategy::new(Arc::clone(&api))),
            Arc::new(StagingStrategy::new(api)),
            Platform::current(),
        )
    }

    /// Resolve for another platform than the current one
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn strategy_for(&self, provenance: Provenance) -> &dyn ProvenanceStrategy {
        match provenance {
            Provenance::Released => self.released.as_ref(),
            Provenance::Snapshot => self.snapshot.as_ref(),
            Provenance::BuildCandidate => self.staging.as_ref(),
        }
    }

    /// Resolve `product` at `version` without consulting any cache.
    ///
    /// Prefer [`StructuredVersion::artifact`], which memoizes per version.
    pub async fn resolve(
        &self,
        product: &Product,
        version: &StructuredVersion,
    ) -> Result<ArtifactDescriptor, ClusterError> {
        debug!(
            "Resolving {} {} ({}) for {}",
            product,
            version,
            version.provenance(),
            self.platform
        );
        let descriptor = self
            .strategy_for(version.provenance())
            .resolve(product, version, self.platform)
            .await?;

        // downstream consumers fetch the URL as is
        if descriptor.download_url.is_empty() || descriptor.download_url.contains('{') {
            return Err(ClusterError::unresolvable(
                product.id(),
                version,
                format!("unusable download url '{}'", descriptor.download_url),
            ));
        }
        Ok(descriptor)
    }
}
