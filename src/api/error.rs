//! Failure kinds for backend calls

use thiserror::Error;

/// Why a backend call produced no usable result.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, reset, or a transport error while reading the body.
    #[error("backend unreachable at {url}: {source}")]
    NetworkUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status} for {url}: {body}")]
    RequestFailed {
        url: String,
        status: u16,
        body: String,
    },

    /// Success status, but the payload was missing, malformed, or empty.
    #[error("no usable data from {url}: {detail}")]
    EmptyResult { url: String, detail: String },
}

impl BackendError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::NetworkUnavailable { .. } => "network_unavailable",
            BackendError::RequestFailed { .. } => "request_failed",
            BackendError::EmptyResult { .. } => "empty_result",
        }
    }

    pub(crate) fn empty(url: &str, detail: impl Into<String>) -> Self {
        BackendError::EmptyResult {
            url: url.to_string(),
            detail: detail.into(),
        }
    }
}
