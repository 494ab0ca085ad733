//! Error types for the agent client.

use thiserror::Error;

/// Agent client error type.
#[derive(Error, Debug)]
pub enum AgentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while framing the body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent endpoint returned a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or response text.
        message: String,
    },

    /// Response carried no readable body.
    #[error("Response body is not readable")]
    MissingBody,

    /// Transport failed while the stream was being read.
    #[error("{0}")]
    Transport(String),

    /// The run was cancelled through its cancellation token.
    #[error("Run aborted")]
    Aborted,

    /// Invalid client settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Whether this error is the cancellation signal rather than a failure.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Result type alias for agent client operations.
pub type Result<T> = std::result::Result<T, AgentError>;
