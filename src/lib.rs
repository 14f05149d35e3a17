//! Scoretrail - versioned analysis report comparison
//!
//! Loads every analysis version of a subject from a report service,
//! orders and validates them, computes score deltas between consecutive
//! versions, and decides where a version selection should navigate.
//!
//! - [`loader::VersionStore`] fetches and memoizes version sets per subject.
//! - [`comparison`] holds the pure comparison rules.
//! - [`view::ComparisonSession`] is the open/close/select state machine a
//!   host view drives.

pub mod cli;
pub mod comparison;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
pub mod service;
pub mod view;

pub use comparison::Navigation;
pub use error::LoadError;
pub use models::{AnalysisId, AnalysisVersion, SubjectId, VersionSet};
