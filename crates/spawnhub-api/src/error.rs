//! Control client errors.

use std::time::Duration;

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("daemon answered {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("cannot reach spawnhub daemon at {url} (is `spawnhubd watch` running?): {reason}")]
    Unreachable { url: String, reason: String },

    #[error("daemon call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed daemon response: {0}")]
    Decode(String),

    #[error("invalid daemon configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// HTTP status from the daemon, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
