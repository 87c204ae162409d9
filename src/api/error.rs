//! Error types for backend fetches.

use thiserror::Error;

/// Why a channel refresh did not produce a payload.
///
/// Errors are cloned into the owning slot so the view can show which
/// channels are stale and why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not complete (connect failure, timeout, reset).
    #[error("network failure: {0}")]
    Network(String),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {0}")]
    Protocol(u16),

    /// The body was not valid JSON of the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The dashboard was torn down before the result could be applied.
    #[error("refresh cancelled")]
    Cancelled,
}

impl FetchError {
    /// Short label for the failure kind, used in the status bar.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Protocol(_) => "http",
            FetchError::Decode(_) => "decode",
            FetchError::Cancelled => "cancelled",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Protocol(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
