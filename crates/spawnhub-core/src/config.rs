//! spawnhub.toml configuration parser.
//!
//! Every value has a default so an empty file is a valid configuration.
//! The parsed [`HubConfig`] is passed explicitly to the components that
//! need it; nothing reads configuration from process-wide state.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ImageDescriptor;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required value: {0}")]
    Missing(&'static str),

    #[error("invalid duration for {field}: {value:?}")]
    Duration { field: &'static str, value: String },

    #[error("invalid socket address for {field}: {value:?}")]
    Address { field: &'static str, value: String },

    #[error("duplicate image in catalogue: {0}")]
    DuplicateImage(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    pub spawner: SpawnerConfig,
    pub claims: ClaimNames,
    pub cluster: ClusterConfig,
    pub proxy: ProxyConfig,
    pub state: StateConfig,
    pub monitor: MonitorConfig,
    pub daemon: DaemonConfig,
    pub images: Vec<ImageDescriptor>,
}

/// Mount layout and container defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnerConfig {
    pub mount_root: String,
    pub project_subdir: String,
    pub report_subdir: String,
    pub report_prepare_subdir: String,
    pub synchron_subdir: String,
    pub git_subdir: String,
    /// Exported to containers as `PREFIX`.
    pub name_prefix: String,
    /// Volume names are `{volume_prefix}-{class}`.
    pub volume_prefix: String,
    pub locale: String,
    /// `SSH_AUTH_SOCK` is `{ssh_auth_sock_dir}/{username}`.
    pub ssh_auth_sock_dir: String,
    pub image_pull_policy: String,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            mount_root: "/mnt".to_string(),
            project_subdir: "project".to_string(),
            report_subdir: "report".to_string(),
            report_prepare_subdir: "report_prepare".to_string(),
            synchron_subdir: "synchron".to_string(),
            git_subdir: "git".to_string(),
            name_prefix: "spawnhub".to_string(),
            volume_prefix: "pv-spawnhub".to_string(),
            locale: "en_US.UTF-8".to_string(),
            ssh_auth_sock_dir: "/tmp".to_string(),
            image_pull_policy: "IfNotPresent".to_string(),
        }
    }
}

/// Persistent volume claim name per claim class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClaimNames {
    pub home: String,
    pub project: String,
    pub report: String,
    pub cache: String,
}

impl Default for ClaimNames {
    fn default() -> Self {
        Self {
            home: "pvc-home-spawnhub".to_string(),
            project: "pvc-project-spawnhub".to_string(),
            report: "pvc-report-spawnhub".to_string(),
            cache: "pvc-cache-spawnhub".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    pub namespace: String,
    /// Upper bound for a single scheduling API call, e.g. "30s".
    pub request_timeout: String,
    /// Upper bound for a deleted workload to finish terminating on restart.
    pub deletion_timeout: String,
    /// Exposures are reachable at `{label}.{namespace}.{exposure_domain}`.
    pub exposure_domain: String,
    /// Label key tying exposures to workloads.
    pub selector_key: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            request_timeout: "30s".to_string(),
            deletion_timeout: "120s".to_string(),
            exposure_domain: "svc.cluster.local".to_string(),
            selector_key: "lbl".to_string(),
        }
    }
}

impl ClusterConfig {
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.request_timeout).ok_or_else(|| ConfigError::Duration {
            field: "cluster.request_timeout",
            value: self.request_timeout.clone(),
        })
    }

    pub fn deletion_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.deletion_timeout).ok_or_else(|| ConfigError::Duration {
            field: "cluster.deletion_timeout",
            value: self.deletion_timeout.clone(),
        })
    }

    /// In-cluster host name of a service's exposure.
    pub fn exposure_host(&self, label: &str) -> String {
        format!("{label}.{}.{}", self.namespace, self.exposure_domain)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL of the reverse-proxy control API.
    pub api_url: String,
    pub auth_token: Option<String>,
    pub request_timeout: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8001".to_string(),
            auth_token: None,
            request_timeout: "10s".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.request_timeout).ok_or_else(|| ConfigError::Duration {
            field: "proxy.request_timeout",
            value: self.request_timeout.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StateConfig {
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/spawnhub/spawnhub.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pause between two check sweeps, e.g. "60s".
    pub interval: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: "60s".to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.interval).ok_or_else(|| ConfigError::Duration {
            field: "monitor.interval",
            value: self.interval.clone(),
        })
    }
}

/// Control API served by `spawnhubd watch` and used by the other commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    pub listen: String,
    /// Upper bound for one control call; a restart waits for termination.
    pub request_timeout: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:7870".to_string(),
            request_timeout: "300s".to_string(),
        }
    }
}

impl DaemonConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|_| ConfigError::Address {
            field: "daemon.listen",
            value: self.listen.clone(),
        })
    }

    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.request_timeout).ok_or_else(|| ConfigError::Duration {
            field: "daemon.request_timeout",
            value: self.request_timeout.clone(),
        })
    }
}

impl HubConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(?path, images = config.images.len(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the composer and cluster client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (self.spawner.mount_root.as_str(), "spawner.mount_root"),
            (self.spawner.volume_prefix.as_str(), "spawner.volume_prefix"),
            (self.cluster.namespace.as_str(), "cluster.namespace"),
            (self.cluster.selector_key.as_str(), "cluster.selector_key"),
            (self.claims.home.as_str(), "claims.home"),
            (self.claims.project.as_str(), "claims.project"),
            (self.claims.report.as_str(), "claims.report"),
            (self.claims.cache.as_str(), "claims.cache"),
        ];
        for (value, field) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(field));
            }
        }

        self.cluster.request_timeout()?;
        self.cluster.deletion_timeout()?;
        self.proxy.request_timeout()?;
        self.monitor.interval()?;
        self.daemon.listen_addr()?;
        self.daemon.request_timeout()?;

        for (i, image) in self.images.iter().enumerate() {
            if self.images[..i].iter().any(|other| other.name == image.name) {
                return Err(ConfigError::DuplicateImage(image.name.clone()));
            }
        }
        Ok(())
    }

    /// Look up an image descriptor by name.
    pub fn image(&self, name: &str) -> Option<&ImageDescriptor> {
        self.images.iter().find(|image| image.name == name)
    }
}

/// Parse a duration string like "5s", "500ms", "2m" or a bare number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
