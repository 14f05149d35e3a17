//! Version loading.
//!
//! This module fetches the versions of a subject from the report service
//! and memoizes them per subject for the lifetime of a session.

pub mod store;

pub use store::VersionStore;
