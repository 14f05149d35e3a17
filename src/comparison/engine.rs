//! Ordering-aware comparison rules.

use crate::models::{AnalysisId, AnalysisVersion, VersionSet};
use serde::Serialize;
use tracing::warn;

/// What the host view should do after a version is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "analysis_id", rename_all = "snake_case")]
pub enum Navigation {
    /// Nothing to do: the selection is already displayed.
    NoOp,
    /// Open the detail view of this analysis.
    Open(AnalysisId),
}

/// Whether the comparison affordance is shown at all.
///
/// A subject with zero or one version has nothing to compare.
pub fn should_display(set: &VersionSet) -> bool {
    set.len() > 1
}

/// Score change of `set[index]` relative to its predecessor.
///
/// `None` for the first version and for an index past the end.
pub fn score_delta(set: &VersionSet, index: usize) -> Option<i64> {
    if index == 0 {
        return None;
    }
    let current = set.get(index)?;
    let previous = set.get(index - 1)?;
    Some(score_change(previous, current))
}

/// `to.overall_score - from.overall_score`, saturating at the `i64` bounds
/// since scores come straight off the wire.
pub fn score_change(from: &AnalysisVersion, to: &AnalysisVersion) -> i64 {
    to.overall_score.saturating_sub(from.overall_score)
}

/// Delta for every position, in order.
pub fn score_deltas(set: &VersionSet) -> Vec<Option<i64>> {
    (0..set.len()).map(|i| score_delta(set, i)).collect()
}

/// Total movement from the earliest to the latest version.
pub fn overall_trend(set: &VersionSet) -> i64 {
    match (set.first(), set.last()) {
        (Some(first), Some(last)) => score_change(first, last),
        _ => 0,
    }
}

/// The version flagged current, if any. Having none is a valid state.
pub fn current_version(set: &VersionSet) -> Option<&AnalysisVersion> {
    set.iter().find(|v| v.is_current)
}

/// The version the primary view shows: the current one, or the most
/// recent when nothing is flagged.
pub fn displayed_version(set: &VersionSet) -> Option<&AnalysisVersion> {
    current_version(set).or_else(|| set.last())
}

/// Navigation intent for selecting `selected` in the comparison list.
pub fn navigate_target(set: &VersionSet, selected: &AnalysisId) -> Navigation {
    match set.find(selected) {
        Some(version) if version.is_current => Navigation::NoOp,
        Some(version) => Navigation::Open(version.analysis_id.clone()),
        None => {
            warn!("Selected analysis {} is not part of this subject", selected);
            Navigation::NoOp
        }
    }
}
