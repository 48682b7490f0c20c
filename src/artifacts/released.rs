//! Public releases live at fixed, templated locations

use super::{ArtifactDescriptor, Platform, ProvenanceStrategy, Product};
use crate::error::ClusterError;
use crate::version::StructuredVersion;
use async_trait::async_trait;

/// Builds release URLs from the release base location, no network needed
#[derive(Debug, Clone)]
pub struct ReleasedStrategy {
    base_url: String,
}

impl ReleasedStrategy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn download_url(&self, product: &Product, version: &StructuredVersion, platform: Platform) -> String {
        match product {
            Product::Server(server) => {
                let id = server.product_id();
                format!(
                    "{base}/bundle/{id}/{v}/{id}-{v}-{platform}.{ext}",
                    base = self.base_url,
                    id = id,
                    v = version,
                    platform = platform.moniker(),
                    ext = platform.archive_extension(),
                )
            }
            Product::Plugin(plugin) => format!(
                "{base}/plugins/{name}/{v}/{name}-{v}.zip",
                base = self.base_url,
                name = plugin.name,
                v = version,
            ),
        }
    }
}

#[async_trait]
impl ProvenanceStrategy for ReleasedStrategy {
    async fn resolve(
        &self,
        product: &Product,
        version: &StructuredVersion,
        platform: Platform,
    ) -> Result<ArtifactDescriptor, ClusterError> {
        let url = self.download_url(product, version, platform);
        Ok(ArtifactDescriptor::for_product(product, version, platform, url))
    }
}
