//! Error types for loading analysis versions.

use thiserror::Error;

/// Failure to load the versions of a subject.
///
/// An empty result is not an error. `Clone` so one in-flight fetch can hand
/// its outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Transport, service, or decoding failure.
    #[error("Failed to fetch versions: {message}")]
    FetchFailed { message: String },
}

impl LoadError {
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        LoadError::FetchFailed {
            message: message.into(),
        }
    }

    /// The human-readable message shown to the user.
    pub fn message(&self) -> &str {
        match self {
            LoadError::FetchFailed { message } => message,
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LoadError::fetch_failed("Request to report service timed out")
        } else if e.is_connect() {
            LoadError::fetch_failed(format!("Cannot connect to report service: {}", e))
        } else if e.is_decode() {
            LoadError::fetch_failed(format!("Invalid response from report service: {}", e))
        } else {
            LoadError::fetch_failed(format!("Report service request failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_display() {
        let err = LoadError::fetch_failed("connection reset");
        assert_eq!(err.message(), "connection reset");
        assert_eq!(err.to_string(), "Failed to fetch versions: connection reset");
    }
}
