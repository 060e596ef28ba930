//! spawnhub-orchestrator: lifecycle control for user services.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├── ServiceRepository (load / save Service records)
//!   ├── VolumeComposer + WorkloadSpecBuilder (pure manifest rendering)
//!   ├── ClusterApi (idempotent create / delete / logs)
//!   ├── RouteRegistrar (proxy routes)
//!   └── LabelLocks (one operation per label at a time)
//!
//! CheckMonitor
//!   └── periodic Orchestrator::check over live services
//! ```
//!
//! `start` creates the exposure, then the workload, then the route; `stop`
//! tears them down in reverse. State only moves along the edges allowed by
//! [`spawnhub_core::ServiceState::can_transition_to`].

pub mod error;
pub mod locks;
pub mod logs;
pub mod monitor;
pub mod orchestrator;

pub use error::{OrchestratorError, OrchestratorResult};
pub use locks::{LabelGuard, LabelLocks};
pub use logs::extract_message;
pub use monitor::{CheckMonitor, SweepReport};
pub use orchestrator::Orchestrator;
