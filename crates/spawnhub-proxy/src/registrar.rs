//! The route registration seam.

use std::fmt;

use async_trait::async_trait;

use crate::error::RouteResult;

/// Internal address a route forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteTarget {
    pub host: String,
    pub port: u16,
}

impl RouteTarget {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }

    /// Target URL as the proxy expects it.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Registers external paths with the reverse proxy.
///
/// Adding an existing path replaces its target. Removing a missing path
/// succeeds.
#[async_trait]
pub trait RouteRegistrar: Send + Sync {
    async fn add_route(&self, path: &str, target: &RouteTarget) -> RouteResult<()>;

    async fn remove_route(&self, path: &str) -> RouteResult<()>;
}
