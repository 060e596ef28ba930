//! The cluster client seam and outcome classification.

use async_trait::async_trait;
use tracing::info;

use spawnhub_workload::{Exposure, Workload};

use crate::error::{ClusterError, ClusterResult};

/// Result of an accepted create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The remote reported a conflict; the resource is already there.
    AlreadyExists,
}

/// Result of an accepted delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The remote reported the resource missing.
    NotFound,
}

/// Idempotent operations against the scheduling API, scoped to one namespace.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create_workload(&self, spec: &Workload) -> ClusterResult<CreateOutcome>;

    async fn create_exposure(&self, spec: &Exposure) -> ClusterResult<CreateOutcome>;

    async fn delete_workload(&self, name: &str) -> ClusterResult<DeleteOutcome>;

    async fn delete_exposure(&self, name: &str) -> ClusterResult<DeleteOutcome>;

    /// Wait until a deleted workload has finished terminating.
    ///
    /// A delete is accepted while the workload is still shutting down; a
    /// create under the same name in that window is answered with a
    /// conflict. Returns at once if the workload is already gone.
    async fn await_workload_gone(&self, name: &str) -> ClusterResult<()>;

    /// Raw log output of the workload's container.
    async fn read_logs(&self, name: &str) -> ClusterResult<String>;
}

/// Fold a raw create result into a [`CreateOutcome`], absorbing conflicts.
pub fn classify_create(
    kind: &str,
    name: &str,
    result: Result<(), ClusterError>,
) -> ClusterResult<CreateOutcome> {
    match result {
        Ok(()) => {
            info!(kind, name, "created");
            Ok(CreateOutcome::Created)
        }
        Err(e) if e.is_conflict() => {
            info!(kind, name, message = %e.message(), "already exists, treating as created");
            Ok(CreateOutcome::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}

/// Fold a raw delete result into a [`DeleteOutcome`], absorbing not-found.
pub fn classify_delete(
    kind: &str,
    name: &str,
    result: Result<(), ClusterError>,
) -> ClusterResult<DeleteOutcome> {
    match result {
        Ok(()) => {
            info!(kind, name, "deleted");
            Ok(DeleteOutcome::Deleted)
        }
        Err(e) if e.is_not_found() => {
            info!(kind, name, message = %e.message(), "already absent, treating as deleted");
            Ok(DeleteOutcome::NotFound)
        }
        Err(e) => Err(e),
    }
}
