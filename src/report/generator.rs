//! Markdown and JSON comparison reports.

use crate::comparison::{Comparison, Navigation, StepChange, VersionRow};
use crate::models::{AnalysisId, IntegrityWarning, SubjectId};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about the comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub subject: SubjectId,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Report service the versions were read from.
    pub service_url: String,
    pub version_count: usize,
}

/// Everything the CLI prints for one subject.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub metadata: ReportMetadata,
    pub comparison: Comparison,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<IntegrityWarning>,
    /// Intent for a `--select`ed version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Navigation>,
}

/// Markdown rendering switches.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub include_names: bool,
    pub include_timestamps: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_names: true,
            include_timestamps: true,
        }
    }
}

/// Signed delta, `n/a` for the earliest version.
pub fn format_delta(delta: Option<i64>) -> String {
    match delta {
        Some(d) if d > 0 => format!("+{}", d),
        Some(d) => d.to_string(),
        None => "n/a".to_string(),
    }
}

fn trend_arrow(delta: i64) -> &'static str {
    match delta {
        d if d > 0 => "▲",
        d if d < 0 => "▼",
        _ => "=",
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ComparisonReport, options: ReportOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Version Comparison: {}\n\n", report.metadata.subject));
    output.push_str(&generate_metadata_section(&report.metadata));

    if report.comparison.display {
        output.push_str(&generate_summary_section(&report.comparison));
        output.push_str(&generate_versions_section(&report.comparison.rows, options));
    } else {
        output.push_str(&generate_unavailable_section(report.metadata.version_count));
    }

    if let Some(ref navigation) = report.navigation {
        output.push_str(&generate_navigation_section(navigation));
    }

    output.push_str(&generate_warnings_section(&report.warnings));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Subject:** `{}`\n", metadata.subject));
    section.push_str(&format!("- **Report Service:** {}\n", metadata.service_url));
    section.push_str(&format!("- **Versions:** {}\n", metadata.version_count));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_summary_section(comparison: &Comparison) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "- **Overall Trend:** {} {}\n",
        trend_arrow(comparison.overall_trend),
        format_delta(Some(comparison.overall_trend))
    ));
    if let Some(ref displayed) = comparison.displayed {
        section.push_str(&format!("- **Current Version:** `{}`\n", displayed));
    }
    if let Some(ref best) = comparison.best {
        section.push_str(&format!("- **Best Score:** `{}`\n", best));
    }
    if let Some(ref worst) = comparison.worst {
        section.push_str(&format!("- **Lowest Score:** `{}`\n", worst));
    }
    if let Some(ref gain) = comparison.biggest_gain {
        section.push_str(&format!("- **Biggest Gain:** {}\n", describe_step(gain)));
    }
    if let Some(ref drop) = comparison.biggest_drop {
        section.push_str(&format!("- **Biggest Drop:** {}\n", describe_step(drop)));
    }
    section.push('\n');

    section
}

fn describe_step(step: &StepChange) -> String {
    format!(
        "{} (`{}` → `{}`)",
        format_delta(Some(step.delta)),
        step.from,
        step.to
    )
}

fn generate_versions_section(rows: &[VersionRow], options: ReportOptions) -> String {
    let mut section = String::new();

    section.push_str("## Versions\n\n");

    let mut header = vec!["Version"];
    if options.include_names {
        header.push("Name");
    }
    header.extend(["Score", "Δ"]);
    if options.include_timestamps {
        header.push("Created");
    }
    header.extend(["Analysis", "Current"]);

    section.push_str(&format!("| {} |\n", header.join(" | ")));
    section.push_str(&format!(
        "|{}\n",
        header.iter().map(|_| ":---:|").collect::<String>()
    ));

    for row in rows {
        let v = &row.version;
        let mut cells = vec![format!("v{}", v.version)];
        if options.include_names {
            cells.push(escape_cell(v.name.as_deref().unwrap_or_default()));
        }
        cells.push(v.overall_score.to_string());
        cells.push(format_delta(row.delta));
        if options.include_timestamps {
            cells.push(v.created_at.format("%Y-%m-%d %H:%M").to_string());
        }
        cells.push(format!("`{}`", escape_cell(v.analysis_id.as_str())));
        cells.push(if v.is_current { "●" } else { "" }.to_string());

        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Keep a table cell on one row: pipes escaped, line breaks flattened.
fn escape_cell(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .replace('|', "\\|")
}

fn generate_unavailable_section(version_count: usize) -> String {
    let reason = match version_count {
        0 => "this subject has no analysis versions".to_string(),
        n => format!("this subject has only {} analysis version", n),
    };
    format!("## Comparison Unavailable\n\nNothing to compare: {}.\n\n", reason)
}

fn generate_navigation_section(navigation: &Navigation) -> String {
    let mut section = String::new();

    section.push_str("## Selection\n\n");
    match navigation {
        Navigation::NoOp => {
            section.push_str("Selected version is already displayed; nothing to open.\n\n")
        }
        Navigation::Open(id) => section.push_str(&format!("Open analysis `{}`.\n\n", id)),
    }

    section
}

fn generate_warnings_section(warnings: &[IntegrityWarning]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Data Integrity Warnings\n\n");
    for warning in warnings {
        section.push_str(&format!("- ⚠️ {}\n", warning));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by scoretrail*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ComparisonReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// The analysis id a navigation intent points at, if any.
pub fn navigation_target(navigation: &Navigation) -> Option<&AnalysisId> {
    match navigation {
        Navigation::Open(id) => Some(id),
        Navigation::NoOp => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::compare;
    use crate::models::{test_version, VersionSet};

    fn create_test_report(set: &VersionSet) -> ComparisonReport {
        ComparisonReport {
            metadata: ReportMetadata {
                subject: SubjectId::from("funnel-42"),
                generated_at: Utc::now(),
                service_url: "http://localhost:8080".to_string(),
                version_count: set.len(),
            },
            comparison: compare(set),
            warnings: set.warnings().to_vec(),
            navigation: None,
        }
    }

    fn scenario() -> VersionSet {
        let mut v2 = test_version("v2", 2, 68, false);
        v2.name = Some("New checkout".to_string());
        VersionSet::normalize(vec![
            test_version("v1", 1, 55, false),
            v2,
            test_version("v3", 3, 82, true),
        ])
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(None), "n/a");
        assert_eq!(format_delta(Some(13)), "+13");
        assert_eq!(format_delta(Some(-5)), "-5");
        assert_eq!(format_delta(Some(0)), "0");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(&scenario());
        let markdown = generate_markdown_report(&report, ReportOptions::default());

        assert!(markdown.contains("# Version Comparison: funnel-42"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("▲ +27"));
        assert!(markdown.contains("| Version | Name | Score | Δ | Created | Analysis | Current |"));
        assert!(markdown.contains("| v2 | New checkout | 68 | +13 |"));
        assert!(markdown.contains("| v3 |  | 82 | +14 |"));
        assert!(!markdown.contains("Comparison Unavailable"));
        assert!(!markdown.contains("Data Integrity"));
    }

    #[test]
    fn test_markdown_without_optional_columns() {
        let report = create_test_report(&scenario());
        let markdown = generate_markdown_report(
            &report,
            ReportOptions {
                include_names: false,
                include_timestamps: false,
            },
        );

        assert!(markdown.contains("| Version | Score | Δ | Analysis | Current |"));
        assert!(markdown.contains("| v1 | 55 | n/a | `v1` |  |"));
        assert!(markdown.contains("| v3 | 82 | +14 | `v3` | ● |"));
    }

    #[test]
    fn test_table_cells_are_escaped() {
        let mut v1 = test_version("an|1", 1, 55, false);
        v1.name = Some("a|b\nc\r\nd".to_string());
        let set = VersionSet::normalize(vec![v1, test_version("v2", 2, 60, true)]);
        let markdown = generate_markdown_report(&create_test_report(&set), ReportOptions::default());

        let row = markdown
            .lines()
            .find(|line| line.starts_with("| v1 |"))
            .unwrap();
        assert!(row.contains("| a\\|b c d | 55 |"));
        assert!(row.contains("`an\\|1`"));
        assert!(row.ends_with("|  |"));
        assert_eq!(row.matches(" | ").count(), 6);
        assert_eq!(escape_cell("plain"), "plain");
    }

    #[test]
    fn test_single_version_is_unavailable() {
        let set = VersionSet::normalize(vec![test_version("only", 1, 64, true)]);
        let markdown = generate_markdown_report(&create_test_report(&set), ReportOptions::default());

        assert!(markdown.contains("## Comparison Unavailable"));
        assert!(markdown.contains("only 1 analysis version"));
        assert!(!markdown.contains("## Versions"));
    }

    #[test]
    fn test_navigation_and_warnings_sections() {
        let set = VersionSet::normalize(vec![
            test_version("a", 1, 10, true),
            test_version("b", 2, 20, true),
        ]);
        let mut report = create_test_report(&set);
        report.navigation = Some(Navigation::Open(AnalysisId::from("a")));

        let markdown = generate_markdown_report(&report, ReportOptions::default());

        assert!(markdown.contains("Open analysis `a`."));
        assert!(markdown.contains("multiple current versions: a, b"));
        assert_eq!(
            navigation_target(report.navigation.as_ref().unwrap()),
            Some(&AnalysisId::from("a"))
        );
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(&scenario());
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["subject"], "funnel-42");
        assert_eq!(value["comparison"]["overall_trend"], 27);
        assert_eq!(value["comparison"]["rows"][0]["delta"], serde_json::Value::Null);
        assert_eq!(value["comparison"]["rows"][2]["delta"], 14);
        assert_eq!(value["comparison"]["rows"][2]["is_current"], true);
        assert!(value.get("navigation").is_none());
    }
}
