use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while capturing, storing or exporting
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Validation: listening or copying needs a URL
    #[error("a webhook URL is required")]
    EmptyUrl,
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} is not valid JSON: {source}")]
    MalformedBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("event stream from {url} closed")]
    StreamClosed { url: String },
    #[error("failed to serialize requests: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write export file {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CaptureError {
    /// Validation errors are rejected locally and never change state
    pub fn is_validation(&self) -> bool {
        matches!(self, CaptureError::EmptyUrl | CaptureError::InvalidUrl { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(CaptureError::EmptyUrl.is_validation());
        assert!(
            CaptureError::InvalidUrl {
                url: "nope".into(),
                reason: "relative URL without a base".into(),
            }
            .is_validation()
        );
        assert!(
            !CaptureError::StreamClosed {
                url: "http://localhost".into()
            }
            .is_validation()
        );
    }

    #[test]
    fn test_status_message() {
        let err = CaptureError::Status {
            url: "http://localhost/hook".into(),
            status: 502,
        };
        assert_eq!(err.to_string(), "http://localhost/hook answered with HTTP 502");
    }
}
