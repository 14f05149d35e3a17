//! Report generation.
//!
//! This module renders a loaded comparison as Markdown or JSON.

pub mod generator;

pub use generator::{
    format_delta, generate_json_report, generate_markdown_report, navigation_target,
    ComparisonReport, ReportMetadata, ReportOptions,
};
