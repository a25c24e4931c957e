//! Typed failures of a page fetch.
//!
//! Loaders never panic or propagate transport errors as-is: every failure is
//! folded into a [`FetchError`] the owning view branches on. The error is
//! cloneable so a failed load can stay attached to the list state.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The backend answered with a non-success status.
    #[error("backend responded {status} {status_text}")]
    Http { status: u16, status_text: String },

    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered, but the body is not a list page.
    #[error("unreadable list response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Build an HTTP error from a status code.
    pub fn http(status: reqwest::StatusCode) -> Self {
        FetchError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// HTTP status code, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => *status >= 500 || *status == 429,
            FetchError::Network(_) => true,
            FetchError::Decode(_) => false,
        }
    }
}

/// Transport failures from `reqwest`. A failure to read the body counts as a
/// network error, not a decode error.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::http(status),
            None => FetchError::Network(err.to_string()),
        }
    }
}
