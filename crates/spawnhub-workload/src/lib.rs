//! spawnhub-workload: turns a service description into cluster manifests.
//!
//! Both stages are pure functions of their inputs:
//!
//! ```text
//! Service + ImageDescriptor
//!   └── VolumeComposer::compose  → ComposedVolumes (mounts + claim flags)
//!        └── WorkloadSpecBuilder::build → WorkloadSpecs (Pod + Service)
//! ```
//!
//! Rebuilding from the same inputs yields byte-identical manifests, so a
//! restarted orchestrator can recreate resources idempotently.

pub mod error;
pub mod spec;
pub mod volumes;

pub use error::{ComposeError, ComposeResult};
pub use spec::{Exposure, Workload, WorkloadSpecBuilder, WorkloadSpecs};
pub use volumes::{ClaimClass, ComposedVolumes, VolumeComposer, VolumeMount};
