//! Error types for request construction and execution.

use thiserror::Error;

/// Result type for request construction and execution.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the request core.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid builder input, reported at the setter call.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Scheme, host and path did not form a syntactically valid URI.
    #[error("failed to construct request URI: {0}")]
    UriConstruction(String),

    /// Network or I/O failure while talking to the remote host.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success response reported by the remote service.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error payload, or the canonical
        /// status reason when the payload carries none.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// The execution was cancelled before it was dispatched.
    #[error("request cancelled before execution")]
    Cancelled,
}

impl Error {
    /// The HTTP status code if this is an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a structured error reported by the remote service.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Whether this is a network or I/O failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
