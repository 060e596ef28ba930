//! Orchestrator error types.

use thiserror::Error;

use spawnhub_cluster::ClusterError;
use spawnhub_core::TransitionError;
use spawnhub_proxy::RouteError;
use spawnhub_state::StateError;
use spawnhub_workload::ComposeError;

/// Errors surfaced by `start`, `stop` and the other lifecycle operations.
///
/// `check` only returns `ServiceNotFound` or `State`; health-check failures
/// are recorded on the service instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error(transparent)]
    InvalidState(#[from] TransitionError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ComposeError),

    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("route error: {0}")]
    Route(#[from] RouteError),

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
