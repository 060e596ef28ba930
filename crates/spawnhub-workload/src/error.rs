//! Composition errors. All of them are raised before any remote call.

use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid endpoint url {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("image not in catalogue: {0}")]
    UnknownImage(String),

    #[error("port {0} is declared by more than one proxy")]
    DuplicatePort(u16),

    #[error("missing required value: {0}")]
    Missing(&'static str),
}
