//! Structured versions and their artifact provenance
//!
//! A [`StructuredVersion`] is a semantic version plus the pipeline that
//! publishes its artifacts. Identity and ordering only look at the semantic
//! version fields; provenance decides how artifacts are resolved.

pub mod parser;
pub mod range;

use crate::artifacts::{ArtifactDescriptor, ArtifactResolver, Product, ResolutionCache};
use crate::error::ClusterError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use parser::{parse, VersionIndex};
pub use range::VersionRange;

/// Which publishing pipeline produced a version's artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Public release
    Released,
    /// Nightly snapshot (also used for unreleased alpha builds)
    Snapshot,
    /// Internal build candidate, optionally pinned by build hash
    BuildCandidate,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Released => write!(f, "released"),
            Provenance::Snapshot => write!(f, "snapshot"),
            Provenance::BuildCandidate => write!(f, "build-candidate"),
        }
    }
}

/// A parsed version with its provenance and per-instance artifact cache
#[derive(Debug, Clone)]
pub struct StructuredVersion {
    version: semver::Version,
    provenance: Provenance,
    build_hash: Option<String>,
    cache: ResolutionCache,
}

impl StructuredVersion {
    /// Create a version from an already classified version string.
    ///
    /// A build hash may only accompany a build candidate. Build candidates
    /// without a hash are allowed: the staging index supplies the newest
    /// hash for that version at resolution time.
    pub fn new(
        version: &str,
        provenance: Provenance,
        build_hash: Option<String>,
    ) -> Result<Self, ClusterError> {
        let build_hash = build_hash.filter(|h| !h.trim().is_empty());
        if build_hash.is_some() && provenance != Provenance::BuildCandidate {
            return Err(ClusterError::MalformedVersion(format!(
                "{} carries a build hash but is a {} version",
                version, provenance
            )));
        }

        Ok(Self {
            version: parse_semver(version)?,
            provenance,
            build_hash,
            cache: ResolutionCache::new(),
        })
    }

    /// Replace the artifact cache, e.g. with [`ResolutionCache::bypass`] in tests
    pub fn with_cache(mut self, cache: ResolutionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Pre-release label, e.g. `SNAPSHOT` or `alpha1`
    pub fn pre_release(&self) -> Option<&str> {
        if self.version.pre.is_empty() {
            None
        } else {
            Some(self.version.pre.as_str())
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn build_hash(&self) -> Option<&str> {
        self.build_hash.as_deref()
    }

    pub fn semver(&self) -> &semver::Version {
        &self.version
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// The bare `major.minor.patch` string
    pub fn anchor(&self) -> String {
        format!("{}.{}.{}", self.major(), self.minor(), self.patch())
    }

    /// Check this version against a range.
    ///
    /// Pre-release versions only satisfy comparators on their own
    /// `major.minor.patch`, so a miss is retried against the bare triple:
    /// `2.4.5-SNAPSHOT` satisfies `<5.0.0`.
    pub fn in_range(&self, range: &VersionRange) -> bool {
        if range.matches(&self.version) {
            return true;
        }
        let whole = semver::Version::new(self.major(), self.minor(), self.patch());
        range.matches(&whole)
    }

    /// Parse `range` and check this version against it
    pub fn in_range_str(&self, range: &str) -> Result<bool, ClusterError> {
        Ok(self.in_range(&VersionRange::parse(range)?))
    }

    /// Compare against a version string; the string must parse as a semantic version
    pub fn compare_to_str(&self, other: &str) -> Result<Ordering, ClusterError> {
        Ok(self.version.cmp(&parse_semver(other)?))
    }

    /// Resolve the artifact for `product`, at most once per version instance
    pub async fn artifact(
        &self,
        product: &Product,
        resolver: &ArtifactResolver,
    ) -> Result<Arc<ArtifactDescriptor>, ClusterError> {
        self.cache
            .get_or_resolve(&product.id(), || resolver.resolve(product, self))
            .await
    }
}

/// Parse a `major.minor.patch[-pre]` string, dropping build metadata
pub(crate) fn parse_semver(version: &str) -> Result<semver::Version, ClusterError> {
    let mut parsed = semver::Version::parse(version.trim())
        .map_err(|e| ClusterError::MalformedVersion(format!("{}: {}", version, e)))?;
    parsed.build = semver::BuildMetadata::EMPTY;
    Ok(parsed)
}

impl PartialEq for StructuredVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for StructuredVersion {}

impl Hash for StructuredVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

impl PartialOrd for StructuredVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StructuredVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl fmt::Display for StructuredVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}
