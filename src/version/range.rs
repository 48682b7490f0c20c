//! Semantic version ranges
//!
//! Ranges accept `||` alternatives; within an alternative comparators may be
//! separated by whitespace (`>=1.0.0 <3.0.0`) or commas (`>=1.0.0, <3.0.0`).
//! A bare version matches exactly (`1.2.3` is `=1.2.3`, `1.2` is any
//! `1.2.x`) and a hyphen range `1.0.0 - 3.0.0` includes both ends.

use crate::error::ClusterError;
use std::fmt;

/// A parsed range expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    source: String,
    alternatives: Vec<semver::VersionReq>,
}

impl VersionRange {
    /// Parse a range expression
    pub fn parse(range: &str) -> Result<Self, ClusterError> {
        let alternatives = range
            .split("||")
            .map(|alternative| {
                let normalized = normalize(alternative);
                if normalized.is_empty() {
                    return Ok(semver::VersionReq::STAR);
                }
                semver::VersionReq::parse(&normalized).map_err(|e| {
                    ClusterError::Config(format!("Invalid version range '{}': {}", range, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: range.trim().to_string(),
            alternatives,
        })
    }

    /// The range that matches every release
    pub fn any() -> Self {
        Self {
            source: "*".to_string(),
            alternatives: vec![semver::VersionReq::STAR],
        }
    }

    /// Check whether a version satisfies any alternative
    pub fn matches(&self, version: &semver::Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Turn one alternative into the comma-separated form `semver` expects
fn normalize(alternative: &str) -> String {
    let tokens: Vec<&str> = alternative
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if let [lower, "-", upper] = tokens.as_slice() {
        return format!(">={}, <={}", lower, upper);
    }

    let mut comparators = Vec::new();
    let mut pending_op = String::new();
    for token in tokens {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            // operator written apart from its version, e.g. ">= 1.0.0"
            pending_op.push_str(token);
            continue;
        }
        if pending_op.is_empty() && is_bare_version(token) {
            comparators.push(format!("={}", token));
        } else {
            comparators.push(format!("{}{}", pending_op, token));
        }
        pending_op.clear();
    }
    comparators.join(", ")
}

/// A version with no operator and no wildcard, e.g. `2.4.5` or `2.4`
fn is_bare_version(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
        && !token.contains(|c: char| matches!(c, 'x' | 'X' | '*'))
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
