//! In-process route table.
//!
//! Maps external paths to their targets. Used where no external proxy is
//! running (local development, tests) and as a record of what the proxy
//! should hold.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::error::RouteResult;
use crate::registrar::{RouteRegistrar, RouteTarget};

/// Route table held in memory. Clones share the same table.
#[derive(Clone, Default)]
pub struct MemoryRoutes {
    routes: Arc<RwLock<BTreeMap<String, RouteTarget>>>,
}

impl MemoryRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target registered for a path.
    pub fn get(&self, path: &str) -> Option<RouteTarget> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.get(path).cloned()
    }

    /// All registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RouteRegistrar for MemoryRoutes {
    async fn add_route(&self, path: &str, target: &RouteTarget) -> RouteResult<()> {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let previous = routes.insert(path.to_string(), target.clone());
        debug!(%path, %target, replaced = previous.is_some(), "route registered");
        Ok(())
    }

    async fn remove_route(&self, path: &str) -> RouteResult<()> {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let existed = routes.remove(path).is_some();
        debug!(%path, existed, "route removed");
        Ok(())
    }
}
