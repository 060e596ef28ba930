//! Shared fakes for orchestrator integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use spawnhub_cluster::{
    classify_create, classify_delete, ClusterApi, ClusterError, ClusterResult, CreateOutcome,
    DeleteOutcome,
};
use spawnhub_core::{HubConfig, ImageDescriptor, ProjectBinding, Proxy, Service};
use spawnhub_orchestrator::Orchestrator;
use spawnhub_proxy::{MemoryRoutes, RouteError, RouteRegistrar, RouteResult, RouteTarget};
use spawnhub_state::ServiceStore;
use spawnhub_workload::{Exposure, Workload};

pub const NOTEBOOK: &str = "registry/notebook:1";
pub const PLAIN: &str = "registry/plain:1";

/// One remote call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateExposure(String),
    CreateWorkload(String),
    DeleteWorkload(String),
    DeleteExposure(String),
    AwaitWorkloadGone(String),
    ReadLogs(String),
    AddRoute(String, String),
    RemoveRoute(String),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

fn remote(status: u16, message: String) -> ClusterError {
    ClusterError::Remote { status, message }
}

/// In-memory scheduling API with conflict / not-found semantics.
#[derive(Default)]
pub struct FakeCluster {
    journal: Journal,
    workloads: Mutex<HashMap<String, Workload>>,
    exposures: Mutex<HashMap<String, Exposure>>,
    logs: Mutex<HashMap<String, String>>,
    pub fail_workload_create: Mutex<Option<ClusterError>>,
    pub fail_logs: Mutex<Option<ClusterError>>,
    /// Never answer workload creation for this name.
    pub hang_workload: Mutex<Option<String>>,
    /// Pause inside every call, widening race windows.
    pub latency: Mutex<Option<Duration>>,
    /// Deleted workloads linger until awaited, like pods in their grace period.
    pub graceful_delete: AtomicBool,
    terminating: Mutex<HashSet<String>>,
    /// Workloads actually created, conflicts excluded.
    pub workloads_created: AtomicUsize,
}

impl FakeCluster {
    pub fn workload(&self, name: &str) -> Option<Workload> {
        self.workloads.lock().unwrap().get(name).cloned()
    }

    pub fn exposure(&self, name: &str) -> Option<Exposure> {
        self.exposures.lock().unwrap().get(name).cloned()
    }

    pub fn has_exposure(&self, name: &str) -> bool {
        self.exposures.lock().unwrap().contains_key(name)
    }

    pub fn set_logs(&self, name: &str, raw: &str) {
        self.logs
            .lock()
            .unwrap()
            .insert(name.to_string(), raw.to_string());
    }

    pub fn is_terminating(&self, name: &str) -> bool {
        self.terminating.lock().unwrap().contains(name)
    }

    /// Drop a workload behind the orchestrator's back.
    pub fn evict(&self, name: &str) {
        self.workloads.lock().unwrap().remove(name);
    }

    async fn pause(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn create_workload(&self, spec: &Workload) -> ClusterResult<CreateOutcome> {
        let name = spec.metadata.name.clone().unwrap();
        self.journal.record(Call::CreateWorkload(name.clone()));
        self.pause().await;
        let hang = self.hang_workload.lock().unwrap().as_deref() == Some(name.as_str());
        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(e) = self.fail_workload_create.lock().unwrap().clone() {
            return Err(e);
        }
        let result = {
            let mut workloads = self.workloads.lock().unwrap();
            if workloads.contains_key(&name) {
                Err(remote(409, format!("pods \"{name}\" already exists")))
            } else {
                workloads.insert(name.clone(), spec.clone());
                self.workloads_created.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };
        classify_create("workload", &name, result)
    }

    async fn create_exposure(&self, spec: &Exposure) -> ClusterResult<CreateOutcome> {
        let name = spec.metadata.name.clone().unwrap();
        self.journal.record(Call::CreateExposure(name.clone()));
        self.pause().await;
        let result = {
            let mut exposures = self.exposures.lock().unwrap();
            if exposures.contains_key(&name) {
                Err(remote(409, format!("services \"{name}\" already exists")))
            } else {
                exposures.insert(name.clone(), spec.clone());
                Ok(())
            }
        };
        classify_create("exposure", &name, result)
    }

    async fn delete_workload(&self, name: &str) -> ClusterResult<DeleteOutcome> {
        self.journal.record(Call::DeleteWorkload(name.to_string()));
        self.pause().await;
        let present = self.workloads.lock().unwrap().contains_key(name);
        let result = if !present {
            Err(remote(404, format!("pods \"{name}\" not found")))
        } else if self.graceful_delete.load(Ordering::SeqCst) {
            self.terminating.lock().unwrap().insert(name.to_string());
            Ok(())
        } else {
            self.workloads.lock().unwrap().remove(name);
            Ok(())
        };
        classify_delete("workload", name, result)
    }

    async fn await_workload_gone(&self, name: &str) -> ClusterResult<()> {
        self.journal.record(Call::AwaitWorkloadGone(name.to_string()));
        self.pause().await;
        if self.terminating.lock().unwrap().remove(name) {
            self.workloads.lock().unwrap().remove(name);
        }
        Ok(())
    }

    async fn delete_exposure(&self, name: &str) -> ClusterResult<DeleteOutcome> {
        self.journal.record(Call::DeleteExposure(name.to_string()));
        self.pause().await;
        let result = if self.exposures.lock().unwrap().remove(name).is_some() {
            Ok(())
        } else {
            Err(remote(404, format!("services \"{name}\" not found")))
        };
        classify_delete("exposure", name, result)
    }

    async fn read_logs(&self, name: &str) -> ClusterResult<String> {
        self.journal.record(Call::ReadLogs(name.to_string()));
        self.pause().await;
        if let Some(e) = self.fail_logs.lock().unwrap().clone() {
            return Err(e);
        }
        if !self.workloads.lock().unwrap().contains_key(name) {
            return Err(remote(404, format!("pods \"{name}\" not found")));
        }
        Ok(self.logs.lock().unwrap().get(name).cloned().unwrap_or_default())
    }
}

/// Route registrar that journals calls into a [`MemoryRoutes`] table.
#[derive(Default)]
pub struct RecordingRoutes {
    journal: Journal,
    pub table: MemoryRoutes,
    pub reject_add: AtomicBool,
    pub reject_remove: AtomicBool,
}

#[async_trait]
impl RouteRegistrar for RecordingRoutes {
    async fn add_route(&self, path: &str, target: &RouteTarget) -> RouteResult<()> {
        self.journal
            .record(Call::AddRoute(path.to_string(), target.url()));
        if self.reject_add.load(Ordering::SeqCst) {
            return Err(RouteError::Rejected {
                method: "POST",
                path: path.to_string(),
                status: 500,
            });
        }
        self.table.add_route(path, target).await
    }

    async fn remove_route(&self, path: &str) -> RouteResult<()> {
        self.journal.record(Call::RemoveRoute(path.to_string()));
        if self.reject_remove.load(Ordering::SeqCst) {
            return Err(RouteError::Transport("connection refused".to_string()));
        }
        self.table.remove_route(path).await
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub cluster: Arc<FakeCluster>,
    pub routes: Arc<RecordingRoutes>,
    pub store: ServiceStore,
    pub journal: Journal,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        let cluster = Arc::new(FakeCluster {
            journal: journal.clone(),
            ..FakeCluster::default()
        });
        let routes = Arc::new(RecordingRoutes {
            journal: journal.clone(),
            ..RecordingRoutes::default()
        });
        let store = ServiceStore::open_in_memory().unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            &config(),
            Arc::new(store.clone()),
            cluster.clone(),
            routes.clone(),
        ));
        Self {
            orchestrator,
            cluster,
            routes,
            store,
            journal,
        }
    }
}

pub fn config() -> HubConfig {
    HubConfig {
        images: vec![
            ImageDescriptor {
                name: NOTEBOOK.to_string(),
                require_home: true,
                mount_project: true,
                mount_report: false,
            },
            ImageDescriptor {
                name: PLAIN.to_string(),
                require_home: false,
                mount_project: false,
                mount_report: false,
            },
        ],
        ..HubConfig::default()
    }
}

/// Alice's notebook: one proxy on 8888, one project.
pub fn alice() -> Service {
    let mut service = Service::new("nb-alice-1", "alice", NOTEBOOK);
    service.proxies.push(Proxy { port: 8888 });
    service.projects.push(ProjectBinding {
        unique_name: "alice-proj1".to_string(),
    });
    service
}
