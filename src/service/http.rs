//! HTTP client for the report service.

use crate::error::LoadError;
use crate::models::{SubjectId, VersionsResponse};
use crate::service::ReportService;
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`HttpReportService`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Sent as a bearer token when present.
    pub auth_token: Option<String>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            auth_token: None,
        }
    }
}

/// Reads versions from `GET {base_url}/api/subjects/{subject}/versions`.
pub struct HttpReportService {
    options: ServiceOptions,
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpReportService {
    pub fn new(options: ServiceOptions) -> Result<Self, LoadError> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            LoadError::fetch_failed(format!(
                "Invalid report service URL {}: {}",
                options.base_url, e
            ))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(LoadError::fetch_failed(format!(
                "Invalid report service URL {}",
                options.base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        info!("Report service at {}", base_url);

        Ok(Self {
            options,
            base_url,
            http_client,
        })
    }

    /// Endpoint for a subject's versions; the subject id is percent-encoded
    /// as a single path segment.
    pub fn versions_url(&self, subject: &SubjectId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "subjects", subject.as_str(), "versions"]);
        }
        url
    }
}

#[async_trait]
impl ReportService for HttpReportService {
    async fn fetch_versions(
        &self,
        subject: &SubjectId,
        user_id: Option<&str>,
    ) -> Result<VersionsResponse, LoadError> {
        let url = self.versions_url(subject);
        debug!("GET {}", url);

        let mut request = self.http_client.get(url);
        if let Some(user_id) = user_id {
            request = request.query(&[("user_id", user_id)]);
        }
        if let Some(ref token) = self.options.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::fetch_failed(format!(
                    "Request timed out after {}s",
                    self.options.timeout_seconds
                ))
            } else if e.is_connect() {
                LoadError::fetch_failed(format!(
                    "Cannot connect to report service at {}",
                    self.options.base_url
                ))
            } else {
                LoadError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::fetch_failed(format!(
                "Report service error {}: {}",
                status,
                body.trim()
            )));
        }

        let versions: VersionsResponse = response.json().await?;
        debug!(
            "Received {} versions for subject {}",
            versions.versions.len(),
            subject
        );

        Ok(versions)
    }
}
