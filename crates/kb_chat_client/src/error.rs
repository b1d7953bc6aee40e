//! Error types for query dispatch and stream consumption.

use thiserror::Error;

/// Failure of a single query, from validation through the end of the stream.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The query was empty or whitespace only. No request was sent.
    #[error("query is empty")]
    EmptyQuery,

    /// The configured timeout elapsed before the server answered.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status. The body was not read.
    #[error("server returned HTTP {code} {reason}")]
    Status { code: u16, reason: String },

    /// Connection, TLS, or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The non-streaming endpoint answered with something that is not a result record.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client construction failed (bad base URL, bad header value).
    #[error("invalid client setup: {0}")]
    Setup(String),
}

impl ClientError {
    /// True for failures the user should see as "timed out" rather than a generic error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout)
    }

    /// Text shown to the person asking. Timeouts and server statuses get their
    /// own wording; everything else is a generic failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Timeout => "The request timed out. Please try again.".to_string(),
            ClientError::Status { code, reason } => {
                format!("Server error: {} {}", code, reason).trim_end().to_string()
            }
            _ => "Something went wrong while fetching the answer. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::InvalidResponse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
