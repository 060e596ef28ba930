//! Cluster client error types.

use std::time::Duration;

use thiserror::Error;

pub type ClusterResult<T> = Result<T, ClusterError>;

/// HTTP status the scheduling API uses for "already exists".
pub const STATUS_CONFLICT: u16 = 409;

/// HTTP status the scheduling API uses for "not found".
pub const STATUS_NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("cluster api returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("cluster transport error: {0}")]
    Transport(String),

    #[error("cluster call timed out after {0:?}")]
    Timeout(Duration),

    #[error("cluster client configuration error: {0}")]
    Config(String),
}

impl ClusterError {
    /// Remote status code, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClusterError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(STATUS_CONFLICT)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(STATUS_NOT_FOUND)
    }

    /// Human-readable message from the error payload.
    pub fn message(&self) -> String {
        match self {
            ClusterError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
