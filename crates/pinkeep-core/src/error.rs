//! Error types for pinkeep-core

use thiserror::Error;

use crate::api::ApiResultCode;

/// Result type alias using pinkeep-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pinkeep-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a usable response (DNS, TLS, connection reset, bad payload)
    #[error("Network error: {0}")]
    Transport(String),

    /// The request exceeded the per-call timeout
    #[error("Request timed out")]
    Timeout,

    /// The server answered but reported a non-success result code
    #[error("API error: {0}")]
    Api(ApiResultCode),

    /// Invalid input, rejected before any remote call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Neither the local cache nor the remote has the requested resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification callers use to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connectivity or timeout; retrying later may succeed
    Transport,
    /// The remote rejected the call with an application result code
    ApiResult,
    /// Malformed input caught locally
    Validation,
    /// The resource does not exist locally or remotely
    NotFound,
    /// Local database or filesystem failure
    Storage,
}

impl Error {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Timeout => ErrorKind::Transport,
            Self::Api(_) => ErrorKind::ApiResult,
            Self::InvalidInput(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Database(_) | Self::Sqlite(_) | Self::Io(_) | Self::Serialization(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Whether this is a timeout, as opposed to any other transport failure.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Database(format!("Database task failed: {error}"))
    }
}
