//! Per-version memoization of resolved artifacts

use super::ArtifactDescriptor;
use crate::error::ClusterError;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

/// Memoizes artifact descriptors by product identifier.
///
/// Clones share the same map. Concurrent misses may each run resolution, but
/// insertion is insert-if-absent: the first stored descriptor is returned to
/// every caller, including the ones whose own result was discarded.
#[derive(Debug, Clone)]
pub struct ResolutionCache {
    entries: Option<Arc<DashMap<String, Arc<ArtifactDescriptor>>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            entries: Some(Arc::new(DashMap::new())),
        }
    }

    /// A cache that never stores anything; every lookup resolves afresh
    pub fn bypass() -> Self {
        Self { entries: None }
    }

    pub fn get(&self, key: &str) -> Option<Arc<ArtifactDescriptor>> {
        let entries = self.entries.as_ref()?;
        entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached descriptor for `key`, resolving and storing it on a miss
    pub async fn get_or_resolve<F, Fut>(
        &self,
        key: &str,
        resolve: F,
    ) -> Result<Arc<ArtifactDescriptor>, ClusterError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ArtifactDescriptor, ClusterError>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let resolved = Arc::new(resolve().await?);
        let Some(entries) = &self.entries else {
            return Ok(resolved);
        };

        let winner = entries.entry(key.to_string()).or_insert(resolved);
        Ok(Arc::clone(&winner))
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}
