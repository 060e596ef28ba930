//! spawnhub-cluster: thin, idempotent wrapper over the scheduling API.
//!
//! Creates report [`CreateOutcome::AlreadyExists`] instead of failing when
//! the remote answers with a conflict, deletes report
//! [`DeleteOutcome::NotFound`] when the target is already gone. Every other
//! remote failure surfaces as a [`ClusterError`] carrying the remote status
//! and message.
//!
//! [`ClusterApi`] is the seam the orchestrator depends on; [`KubeCluster`]
//! implements it against a Kubernetes namespace.

pub mod client;
pub mod error;
pub mod kubernetes;

pub use client::{classify_create, classify_delete, ClusterApi, CreateOutcome, DeleteOutcome};
pub use error::{ClusterError, ClusterResult};
pub use kubernetes::{KubeCluster, DEFAULT_DELETION_TIMEOUT};
