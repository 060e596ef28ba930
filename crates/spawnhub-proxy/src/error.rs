//! Route registration errors.

use std::time::Duration;

use thiserror::Error;

pub type RouteResult<T> = Result<T, RouteError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("proxy rejected {method} {path} with status {status}")]
    Rejected {
        method: &'static str,
        path: String,
        status: u16,
    },

    #[error("proxy transport error: {0}")]
    Transport(String),

    #[error("proxy call timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid proxy configuration: {0}")]
    InvalidConfig(String),
}
