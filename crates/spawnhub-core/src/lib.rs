//! spawnhub-core: domain types and configuration shared by every spawnhub crate.
//!
//! A [`Service`] describes one user's interactive environment: the image it
//! runs, the proxies it exposes, and the projects, synced libraries and
//! repository clones bound to it. Its [`ServiceState`] is only ever changed by
//! the orchestrator.

pub mod config;
pub mod types;

pub use config::{
    ClaimNames, ClusterConfig, ConfigError, DaemonConfig, HubConfig, MonitorConfig, ProxyConfig,
    SpawnerConfig, StateConfig,
};
pub use types::*;
