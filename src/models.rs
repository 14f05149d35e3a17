//! Data models for analysis versions.
//!
//! This module contains the core data structures shared by the loader,
//! the comparison engine, and the view session: a single scored
//! [`AnalysisVersion`] and the validated, ordered [`VersionSet`] of one
//! subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Identifier of a subject (the thing being repeatedly analyzed).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a single analysis version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(String);

impl AnalysisId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnalysisId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One scored snapshot of a subject at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisVersion {
    /// Unique identifier of this analysis.
    pub analysis_id: AnalysisId,
    /// Per-subject sequence number assigned by the producing pipeline.
    pub version: u32,
    /// Optional human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The tracked metric.
    pub overall_score: i64,
    /// When the analysis was produced.
    pub created_at: DateTime<Utc>,
    /// Whether the subject's primary view currently displays this version.
    #[serde(default)]
    pub is_current: bool,
}

impl AnalysisVersion {
    /// Returns the human label, or `v{version}` when unnamed.
    pub fn label(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("v{}", self.version),
        }
    }

    /// Total order used by [`VersionSet`]: `version`, then `created_at`,
    /// then `analysis_id`.
    fn order(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.analysis_id.cmp(&other.analysis_id))
    }
}

/// Wire envelope returned by the report service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionsResponse {
    #[serde(default)]
    pub versions: Vec<AnalysisVersion>,
}

/// A data-integrity problem found while normalizing untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// Input was not sorted by `version`.
    OutOfOrder,
    /// `created_at` goes backwards at this analysis once sorted by `version`.
    TimestampDisagrees { analysis_id: AnalysisId },
    /// A repeated `analysis_id`; later occurrences were dropped.
    DuplicateAnalysisId { analysis_id: AnalysisId },
    /// More than one version was flagged current; only the last kept it.
    MultipleCurrent { analysis_ids: Vec<AnalysisId> },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::OutOfOrder => write!(f, "versions arrived out of order"),
            IntegrityWarning::TimestampDisagrees { analysis_id } => write!(
                f,
                "created_at of {} is earlier than its predecessor",
                analysis_id
            ),
            IntegrityWarning::DuplicateAnalysisId { analysis_id } => {
                write!(f, "duplicate analysis id {}", analysis_id)
            }
            IntegrityWarning::MultipleCurrent { analysis_ids } => {
                let ids: Vec<&str> = analysis_ids.iter().map(AnalysisId::as_str).collect();
                write!(f, "multiple current versions: {}", ids.join(", "))
            }
        }
    }
}

/// The ordered, validated versions of one subject.
///
/// Ordering is ascending by `version`; `created_at` and then `analysis_id`
/// only break ties. At most one element is current and every
/// `analysis_id` is unique. A set is read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionSet {
    versions: Vec<AnalysisVersion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<IntegrityWarning>,
}

impl VersionSet {
    /// Build a set from untrusted input, repairing invariant violations.
    ///
    /// Never fails. Every repair is recorded in [`VersionSet::warnings`]
    /// and logged.
    pub fn normalize(mut versions: Vec<AnalysisVersion>) -> Self {
        let mut warnings = Vec::new();

        if versions.windows(2).any(|w| w[0].order(&w[1]) == Ordering::Greater) {
            warnings.push(IntegrityWarning::OutOfOrder);
            versions.sort_by(|a, b| a.order(b));
        }

        let mut seen = HashSet::new();
        versions.retain(|v| {
            if seen.insert(v.analysis_id.clone()) {
                true
            } else {
                warnings.push(IntegrityWarning::DuplicateAnalysisId {
                    analysis_id: v.analysis_id.clone(),
                });
                false
            }
        });

        for pair in versions.windows(2) {
            if pair[1].created_at < pair[0].created_at {
                warnings.push(IntegrityWarning::TimestampDisagrees {
                    analysis_id: pair[1].analysis_id.clone(),
                });
            }
        }

        let flagged: Vec<usize> = versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_current)
            .map(|(i, _)| i)
            .collect();
        if flagged.len() > 1 {
            warnings.push(IntegrityWarning::MultipleCurrent {
                analysis_ids: flagged
                    .iter()
                    .map(|&i| versions[i].analysis_id.clone())
                    .collect(),
            });
            for &i in &flagged[..flagged.len() - 1] {
                versions[i].is_current = false;
            }
        }

        for warning in &warnings {
            warn!("Version data integrity: {}", warning);
        }

        Self { versions, warnings }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnalysisVersion> {
        self.versions.get(index)
    }

    pub fn first(&self) -> Option<&AnalysisVersion> {
        self.versions.first()
    }

    pub fn last(&self) -> Option<&AnalysisVersion> {
        self.versions.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalysisVersion> {
        self.versions.iter()
    }

    pub fn as_slice(&self) -> &[AnalysisVersion] {
        &self.versions
    }

    /// Index of the version with this id.
    pub fn position(&self, id: &AnalysisId) -> Option<usize> {
        self.versions.iter().position(|v| &v.analysis_id == id)
    }

    pub fn find(&self, id: &AnalysisId) -> Option<&AnalysisVersion> {
        self.versions.iter().find(|v| &v.analysis_id == id)
    }

    /// Repairs applied while normalizing.
    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }
}

impl<'a> IntoIterator for &'a VersionSet {
    type Item = &'a AnalysisVersion;
    type IntoIter = std::slice::Iter<'a, AnalysisVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

impl From<VersionsResponse> for VersionSet {
    fn from(response: VersionsResponse) -> Self {
        Self::normalize(response.versions)
    }
}

/// Shorthand for building versions in tests.
#[cfg(test)]
pub(crate) fn test_version(id: &str, version: u32, score: i64, current: bool) -> AnalysisVersion {
    use chrono::TimeZone;

    AnalysisVersion {
        analysis_id: AnalysisId::from(id),
        version,
        name: None,
        overall_score: score,
        created_at: Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
            + chrono::Duration::days(i64::from(version)),
        is_current: current,
    }
}
