//! Comparison view state.
//!
//! This module holds the transient, per-session state machine the host
//! view drives: open, close, retry, and select.

pub mod session;

pub use session::{ComparisonSession, OpenOutcome, ViewState};
