use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Main error type for baconpath
#[derive(Error, Debug)]
pub enum BaconError {
    /// The SPARQL endpoint could not complete a request
    #[error("Transport error: {0}")]
    Transport(String),

    /// The SPARQL endpoint could not be reached at all
    #[error("Connection error: {0}")]
    Connect(String),

    /// The SPARQL endpoint answered with a non-success status
    #[error("SPARQL endpoint returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// The endpoint answered with something that is not a SPARQL result set
    #[error("Parse error: {0}")]
    Parse(String),

    /// A query or the whole search ran past its time budget
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BaconError {
    /// Whether a failed query is worth another attempt.
    ///
    /// Rate limiting (429), server-side failures (5xx) and refused
    /// connections are transient; everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            BaconError::Http { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            BaconError::Connect(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BaconError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BaconError::Parse(err.to_string())
        } else if err.is_connect() {
            BaconError::Connect(err.to_string())
        } else {
            BaconError::Transport(err.to_string())
        }
    }
}

/// Convenient Result type using BaconError
pub type Result<T> = std::result::Result<T, BaconError>;
