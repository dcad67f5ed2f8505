//! Error types for hub-client

use thiserror::Error;

/// Errors that can occur while fetching artifact metadata
#[derive(Error, Debug)]
pub enum HubError {
    /// URL does not point at a repository we know how to address
    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (DNS, TLS, connection reset, client timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Remote resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Response body was not the JSON we expected
    #[error("JSON decoding error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        HubError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = HubError::Status {
            url: "https://huggingface.co/api/models/a/b".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("api/models/a/b"));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: HubError = serde_json::from_str::<u64>("not json").unwrap_err().into();
        assert!(err.to_string().contains("JSON decoding error"));
    }
}
