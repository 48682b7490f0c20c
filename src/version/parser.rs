//! Turns a user supplied version token into a [`StructuredVersion`]
//!
//! Accepted forms, checked in order:
//! - `2.5.0-SNAPSHOT` (any case): snapshot
//! - `<hash>:2.5.0`: build candidate pinned to `hash`
//! - `latest`: newest release or snapshot across all majors
//! - `latest-<N>`: newest release or snapshot for major `N`
//! - anything else: released if the release index knows it, snapshot if it
//!   carries an `-alpha` label, build candidate otherwise

use super::{parse_semver, Provenance, StructuredVersion};
use crate::error::ClusterError;
use async_trait::async_trait;
use tracing::debug;

const SNAPSHOT_SUFFIX: &str = "-snapshot";
const ALPHA_MARKER: &str = "-alpha";

/// External lookups needed to classify and expand version tokens
#[async_trait]
pub trait VersionIndex: Send + Sync {
    /// Whether the public release index lists `version`
    async fn is_released(&self, version: &str) -> Result<bool, ClusterError>;

    /// Newest release or snapshot across all majors
    async fn latest_release_or_snapshot(&self) -> Result<String, ClusterError>;

    /// Newest release or snapshot within one major
    async fn latest_for_major(&self, major: u64) -> Result<String, ClusterError>;

    /// Hash of the newest build candidate for `version`
    async fn latest_build_hash(&self, version: &str) -> Result<String, ClusterError>;
}

/// Parse a version token.
///
/// Returns `Ok(None)` for an empty or whitespace-only token so "no version
/// configured" stays a valid state.
pub async fn parse(
    raw: &str,
    index: &dyn VersionIndex,
) -> Result<Option<StructuredVersion>, ClusterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if is_snapshot(raw) {
        // snapshots are not pinned by hash; a `<hash>:` prefix is dropped
        let version = match split_build_candidate(raw)? {
            Some((hash, version)) => {
                debug!("Ignoring build hash {} for snapshot {}", hash, version);
                version
            }
            None => raw,
        };
        return StructuredVersion::new(version, Provenance::Snapshot, None).map(Some);
    }

    if let Some((hash, version)) = split_build_candidate(raw)? {
        return StructuredVersion::new(version, Provenance::BuildCandidate, Some(hash.to_string()))
            .map(Some);
    }

    if raw.eq_ignore_ascii_case("latest") {
        let resolved = index.latest_release_or_snapshot().await?;
        debug!("Resolved 'latest' to {}", resolved);
        let provenance = detect_provenance(&resolved, index).await?;
        return StructuredVersion::new(&resolved, provenance, None).map(Some);
    }

    if let Some(major) = latest_major(raw)? {
        let resolved = index.latest_for_major(major).await?;
        debug!("Resolved '{}' to {}", raw, resolved);
        let provenance = detect_provenance(&resolved, index).await?;
        let build_hash = if provenance == Provenance::BuildCandidate {
            Some(index.latest_build_hash(&resolved).await?)
        } else {
            None
        };
        return StructuredVersion::new(&resolved, provenance, build_hash).map(Some);
    }

    let provenance = detect_provenance(raw, index).await?;
    StructuredVersion::new(raw, provenance, None).map(Some)
}

/// Classify a concrete version string
async fn detect_provenance(
    version: &str,
    index: &dyn VersionIndex,
) -> Result<Provenance, ClusterError> {
    if is_snapshot(version) {
        return Ok(Provenance::Snapshot);
    }
    // Reject garbage before asking the index about it
    parse_semver(version)?;

    if index.is_released(version).await? {
        Ok(Provenance::Released)
    } else if version.to_ascii_lowercase().contains(ALPHA_MARKER) {
        // unreleased alphas are published through the snapshot pipeline
        Ok(Provenance::Snapshot)
    } else {
        Ok(Provenance::BuildCandidate)
    }
}

fn is_snapshot(version: &str) -> bool {
    version.to_ascii_lowercase().ends_with(SNAPSHOT_SUFFIX)
}

/// Split `<hash>:<version>` at the first colon
fn split_build_candidate(raw: &str) -> Result<Option<(&str, &str)>, ClusterError> {
    match raw.split_once(':') {
        None => Ok(None),
        Some((hash, version)) => {
            let (hash, version) = (hash.trim(), version.trim());
            if hash.is_empty() || version.is_empty() {
                return Err(ClusterError::MalformedVersion(raw.to_string()));
            }
            Ok(Some((hash, version)))
        }
    }
}

/// Extract `N` from `latest-N`
fn latest_major(raw: &str) -> Result<Option<u64>, ClusterError> {
    let lower = raw.to_ascii_lowercase();
    match lower.strip_prefix("latest-") {
        None => Ok(None),
        Some(major) => major
            .parse()
            .map(Some)
            .map_err(|_| ClusterError::MalformedVersion(raw.to_string())),
    }
}
