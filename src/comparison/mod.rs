//! Version comparison.
//!
//! Pure functions over a loaded [`crate::models::VersionSet`]: display
//! rules, score deltas, trend, the current version, and navigation
//! targets. Nothing here performs I/O.

pub mod engine;
pub mod summary;

pub use engine::*;
pub use summary::{compare, Comparison, StepChange, VersionRow};
