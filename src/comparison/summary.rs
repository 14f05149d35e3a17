//! Whole-set comparison summary.
//!
//! Collects the per-version deltas and a few headline numbers into one
//! serializable value for the report generators.

use crate::comparison::engine::{
    displayed_version, overall_trend, score_change, score_delta, should_display,
};
use crate::models::{AnalysisId, AnalysisVersion, VersionSet};
use serde::Serialize;

/// One version together with its change from the predecessor.
#[derive(Debug, Clone, Serialize)]
pub struct VersionRow {
    #[serde(flatten)]
    pub version: AnalysisVersion,
    /// `None` for the earliest version.
    pub delta: Option<i64>,
}

/// A single consecutive step between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepChange {
    pub from: AnalysisId,
    pub to: AnalysisId,
    pub delta: i64,
}

/// Summary of a subject's version history.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    /// Whether there is anything to compare.
    pub display: bool,
    pub rows: Vec<VersionRow>,
    /// Latest score minus earliest score.
    pub overall_trend: i64,
    /// The version the primary view shows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displayed: Option<AnalysisId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<AnalysisId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst: Option<AnalysisId>,
    /// Largest single-step gain, if any step improved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biggest_gain: Option<StepChange>,
    /// Largest single-step drop, if any step regressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biggest_drop: Option<StepChange>,
}

impl Comparison {
    /// Change introduced by the most recent version.
    pub fn latest_delta(&self) -> Option<i64> {
        self.rows.last().and_then(|row| row.delta)
    }

    /// Whether the most recent version scored lower than its predecessor.
    pub fn is_regression(&self) -> bool {
        self.latest_delta().is_some_and(|delta| delta < 0)
    }
}

/// Build the comparison summary for a loaded set.
pub fn compare(set: &VersionSet) -> Comparison {
    let rows: Vec<VersionRow> = set
        .iter()
        .enumerate()
        .map(|(i, v)| VersionRow {
            version: v.clone(),
            delta: score_delta(set, i),
        })
        .collect();

    // Ties go to the earliest version.
    let best = set
        .iter()
        .rev()
        .max_by_key(|v| v.overall_score)
        .map(|v| v.analysis_id.clone());
    let worst = set
        .iter()
        .min_by_key(|v| v.overall_score)
        .map(|v| v.analysis_id.clone());

    let steps: Vec<StepChange> = set
        .as_slice()
        .windows(2)
        .map(|pair| StepChange {
            from: pair[0].analysis_id.clone(),
            to: pair[1].analysis_id.clone(),
            delta: score_change(&pair[0], &pair[1]),
        })
        .collect();

    let biggest_gain = steps
        .iter()
        .filter(|s| s.delta > 0)
        .rev()
        .max_by_key(|s| s.delta)
        .cloned();
    let biggest_drop = steps
        .iter()
        .filter(|s| s.delta < 0)
        .min_by_key(|s| s.delta)
        .cloned();

    Comparison {
        display: should_display(set),
        rows,
        overall_trend: overall_trend(set),
        displayed: displayed_version(set).map(|v| v.analysis_id.clone()),
        best,
        worst,
        biggest_gain,
        biggest_drop,
    }
}
