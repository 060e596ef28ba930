//! Domain types for spawnhub.
//!
//! These types are persisted as JSON by the state store and consumed by the
//! volume composer, the workload spec builder and the orchestrator.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique service label; doubles as workload name, exposure name and route path.
pub type ServiceLabel = String;

// ── Service ───────────────────────────────────────────────────────

/// One user's compute environment as tracked by the portal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub label: ServiceLabel,
    /// Owning user's login name.
    pub username: String,
    /// Name of an image in the configured catalogue.
    pub image: String,
    /// Exposed proxies, in registration order. The first one is primary.
    #[serde(default)]
    pub proxies: Vec<Proxy>,
    /// Extra environment variables, in declaration order.
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub projects: Vec<ProjectBinding>,
    #[serde(default)]
    pub synced_libraries: Vec<SyncedLibrary>,
    #[serde(default)]
    pub repositories: Vec<RepositoryClone>,
    #[serde(default)]
    state: ServiceState,
    /// Last message observed by a health check.
    #[serde(default)]
    pub last_message: Option<String>,
    /// Unix timestamp (seconds) of `last_message`.
    #[serde(default)]
    pub last_message_at: Option<u64>,
}

impl Service {
    /// Create a service record in `NotPresent` with no bindings.
    pub fn new(label: &str, username: &str, image: &str) -> Self {
        Self {
            label: label.to_string(),
            username: username.to_string(),
            image: image.to_string(),
            proxies: Vec::new(),
            env: Vec::new(),
            projects: Vec::new(),
            synced_libraries: Vec::new(),
            repositories: Vec::new(),
            state: ServiceState::NotPresent,
            last_message: None,
            last_message_at: None,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Move to `next`, rejecting edges the lifecycle does not allow.
    pub fn transition(&mut self, next: ServiceState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                label: self.label.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Record a health-check observation.
    pub fn observe(&mut self, message: String, at: u64) {
        self.last_message = Some(message);
        self.last_message_at = Some(at);
    }

    /// Take `other`'s description, keeping this record's lifecycle state and
    /// last observation.
    pub fn redescribe(self, other: Service) -> Service {
        Service {
            state: self.state,
            last_message: self.last_message,
            last_message_at: self.last_message_at,
            ..other
        }
    }

    /// The port routed by the reverse proxy, if any proxy is declared.
    pub fn primary_port(&self) -> Option<u16> {
        self.proxies.first().map(|p| p.port)
    }
}

/// A port the service serves behind the reverse proxy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proxy {
    pub port: u16,
}

/// A single environment variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// A project bound to a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectBinding {
    /// `<creator>-<cleaned project name>`, unique across the portal.
    pub unique_name: String,
}

/// A library synchronised from a file-sync server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncedLibrary {
    /// Base URL of the sync server.
    pub sync_url: String,
    pub library_name: String,
}

/// A version-control repository cloned into the user's cache area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryClone {
    /// Base URL of the repository host.
    pub repository_url: String,
    pub clone_folder: String,
}

// ── Image ─────────────────────────────────────────────────────────

/// Container image and the storage it expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Image reference, e.g. `registry/notebook:latest`.
    pub name: String,
    #[serde(default)]
    pub require_home: bool,
    #[serde(default)]
    pub mount_project: bool,
    #[serde(default)]
    pub mount_report: bool,
}

// ── State ─────────────────────────────────────────────────────────

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    #[default]
    NotPresent,
    Running,
    NeedRestart,
    Error,
}

impl ServiceState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `NotPresent` is the only way down: every state may stop, but nothing
    /// except a running service may degrade or be recreated in place.
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        match (self, next) {
            (_, NotPresent) => true,
            (NotPresent, Running) => true,
            (Running, Running | NeedRestart | Error) => true,
            (NeedRestart, NeedRestart | Error) => true,
            (Error, Error) => true,
            _ => false,
        }
    }

    /// States in which a failed health check degrades to `Error`.
    pub fn is_live(self) -> bool {
        matches!(self, ServiceState::Running | ServiceState::NeedRestart)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::NotPresent => "not_present",
            ServiceState::Running => "running",
            ServiceState::NeedRestart => "need_restart",
            ServiceState::Error => "error",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("service {label}: cannot move from {from} to {to}")]
pub struct TransitionError {
    pub label: ServiceLabel,
    pub from: ServiceState,
    pub to: ServiceState,
}

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
