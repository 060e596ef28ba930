//! spawnhub-proxy: keeps the reverse-proxy routing table in step with workloads.
//!
//! # Components
//!
//! - **`registrar`**: the [`RouteRegistrar`] seam used by the orchestrator
//! - **`control`**: client for a configurable-http-proxy style control API
//! - **`table`**: in-process route table implementing the same seam

pub mod control;
pub mod error;
pub mod registrar;
pub mod table;

pub use control::HttpRouteRegistrar;
pub use error::{RouteError, RouteResult};
pub use registrar::{RouteRegistrar, RouteTarget};
pub use table::MemoryRoutes;
