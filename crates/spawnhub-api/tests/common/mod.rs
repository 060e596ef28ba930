//! In-memory cluster and orchestrator wiring for control API tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use spawnhub_cluster::{
    classify_create, classify_delete, ClusterApi, ClusterError, ClusterResult, CreateOutcome,
    DeleteOutcome,
};
use spawnhub_core::{HubConfig, ImageDescriptor, Proxy, Service};
use spawnhub_orchestrator::Orchestrator;
use spawnhub_proxy::MemoryRoutes;
use spawnhub_state::ServiceStore;
use spawnhub_workload::{Exposure, Workload};

pub const NOTEBOOK: &str = "registry/notebook:1";

#[derive(Default)]
pub struct MemoryCluster {
    workloads: Mutex<HashSet<String>>,
    exposures: Mutex<HashSet<String>>,
}

impl MemoryCluster {
    pub fn has_workload(&self, name: &str) -> bool {
        self.workloads.lock().unwrap().contains(name)
    }
}

fn remote(status: u16, message: &str) -> ClusterError {
    ClusterError::Remote {
        status,
        message: message.to_string(),
    }
}

fn insert(
    set: &Mutex<HashSet<String>>,
    name: Option<&String>,
) -> (String, Result<(), ClusterError>) {
    let name = name.cloned().unwrap_or_default();
    let result = if set.lock().unwrap().insert(name.clone()) {
        Ok(())
    } else {
        Err(remote(409, "already exists"))
    };
    (name, result)
}

fn remove(set: &Mutex<HashSet<String>>, name: &str) -> Result<(), ClusterError> {
    if set.lock().unwrap().remove(name) {
        Ok(())
    } else {
        Err(remote(404, "not found"))
    }
}

#[async_trait]
impl ClusterApi for MemoryCluster {
    async fn create_workload(&self, spec: &Workload) -> ClusterResult<CreateOutcome> {
        let (name, result) = insert(&self.workloads, spec.metadata.name.as_ref());
        classify_create("workload", &name, result)
    }

    async fn create_exposure(&self, spec: &Exposure) -> ClusterResult<CreateOutcome> {
        let (name, result) = insert(&self.exposures, spec.metadata.name.as_ref());
        classify_create("exposure", &name, result)
    }

    async fn delete_workload(&self, name: &str) -> ClusterResult<DeleteOutcome> {
        classify_delete("workload", name, remove(&self.workloads, name))
    }

    async fn delete_exposure(&self, name: &str) -> ClusterResult<DeleteOutcome> {
        classify_delete("exposure", name, remove(&self.exposures, name))
    }

    async fn await_workload_gone(&self, _name: &str) -> ClusterResult<()> {
        Ok(())
    }

    async fn read_logs(&self, name: &str) -> ClusterResult<String> {
        if self.has_workload(name) {
            Ok(r#"{"message": "ready"}"#.to_string())
        } else {
            Err(remote(404, "pods not found"))
        }
    }
}

pub struct Daemon {
    pub orchestrator: Arc<Orchestrator>,
    pub cluster: Arc<MemoryCluster>,
    pub routes: Arc<MemoryRoutes>,
}

impl Daemon {
    pub fn new() -> Self {
        let config = HubConfig {
            images: vec![ImageDescriptor {
                name: NOTEBOOK.to_string(),
                require_home: true,
                mount_project: false,
                mount_report: false,
            }],
            ..HubConfig::default()
        };
        let cluster = Arc::new(MemoryCluster::default());
        let routes = Arc::new(MemoryRoutes::default());
        let store = ServiceStore::open_in_memory().unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            &config,
            Arc::new(store),
            cluster.clone(),
            routes.clone(),
        ));
        Self {
            orchestrator,
            cluster,
            routes,
        }
    }
}

pub fn alice() -> Service {
    let mut service = Service::new("nb-alice-1", "alice", NOTEBOOK);
    service.proxies.push(Proxy { port: 8888 });
    service
}
