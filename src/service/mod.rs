//! Report service access.
//!
//! This module defines the contract with the external report service and
//! its HTTP implementation.

pub mod http;

pub use http::{HttpReportService, ServiceOptions};

use crate::error::LoadError;
use crate::models::{SubjectId, VersionsResponse};
use async_trait::async_trait;

/// Source of analysis versions for a subject.
///
/// Implementations perform exactly one outbound read per call and never
/// retry. `user_id` is forwarded for access scoping only.
#[async_trait]
pub trait ReportService: Send + Sync {
    async fn fetch_versions(
        &self,
        subject: &SubjectId,
        user_id: Option<&str>,
    ) -> Result<VersionsResponse, LoadError>;
}
