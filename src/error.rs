//! Typed errors for Galaxy list views and their network boundary.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GalaxyError>;

/// Errors surfaced by the list core and the Galaxy HTTP client.
#[derive(Debug, Error)]
pub enum GalaxyError {
    /// Network failure or a response that never produced a status.
    #[error("request failed: {0}")]
    Http(String),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Human-readable message taken from the response body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Rejected locally before any request was issued.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Local storage could not be written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Followed import jobs finished in the `FAILED` state.
    #[error("{0} import(s) failed")]
    ImportFailed(usize),

    /// A list fetch failed; the message is already formatted for display.
    #[error("{0}")]
    Refresh(String),

    /// Settings or endpoint configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GalaxyError {
    /// What: Report whether this error came from the transport or the server.
    ///
    /// Output:
    /// - `true` for `Http` and `Server` variants.
    ///
    /// Details:
    /// - The polling loop uses this to decide that a failed tick is simply retried.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { .. })
    }

    /// What: Report whether the server rejected the request as invalid (4xx).
    #[must_use]
    pub const fn is_client_rejection(&self) -> bool {
        matches!(self, Self::Server { status, .. } if *status >= 400 && *status < 500)
    }
}

impl From<reqwest::Error> for GalaxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Server {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            }
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GalaxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
