//! Kubernetes implementation of [`ClusterApi`].
//!
//! Workloads are Pods and exposures are Services in a single namespace.
//! Every call is bounded by the configured request timeout; a timed-out
//! create leaves whatever the API server already accepted in place.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, DeleteParams, LogParams, PostParams};
use kube::runtime::wait::{await_condition, conditions};
use kube::Client;
use tracing::{debug, info};

use spawnhub_workload::{Exposure, Workload};

use crate::client::{classify_create, classify_delete, ClusterApi, CreateOutcome, DeleteOutcome};
use crate::error::{ClusterError, ClusterResult};

/// Lines of log output fetched per health check.
const LOG_TAIL_LINES: i64 = 200;

/// Longest wait for a deleted workload to terminate. Covers the default
/// 30s grace period with room for slow nodes.
pub const DEFAULT_DELETION_TIMEOUT: Duration = Duration::from_secs(120);

impl From<kube::Error> for ClusterError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(response) => ClusterError::Remote {
                status: response.code,
                message: response.message,
            },
            other => ClusterError::Transport(other.to_string()),
        }
    }
}

/// Cluster client bound to one namespace.
#[derive(Clone)]
pub struct KubeCluster {
    pods: Api<Pod>,
    services: Api<Service>,
    timeout: Duration,
    deletion_timeout: Duration,
}

impl KubeCluster {
    /// Connect using the ambient kubeconfig or in-cluster service account.
    pub async fn connect(namespace: &str, timeout: Duration) -> ClusterResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Config(e.to_string()))?;
        debug!(%namespace, ?timeout, "cluster client connected");
        Ok(Self::from_client(client, namespace, timeout))
    }

    pub fn from_client(client: Client, namespace: &str, timeout: Duration) -> Self {
        Self {
            pods: Api::namespaced(client.clone(), namespace),
            services: Api::namespaced(client, namespace),
            timeout,
            deletion_timeout: DEFAULT_DELETION_TIMEOUT,
        }
    }

    pub fn with_deletion_timeout(mut self, deletion_timeout: Duration) -> Self {
        self.deletion_timeout = deletion_timeout;
        self
    }

    async fn bounded<T, F>(&self, call: F) -> ClusterResult<T>
    where
        F: Future<Output = Result<T, kube::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ClusterError::from),
            Err(_) => Err(ClusterError::Timeout(self.timeout)),
        }
    }
}

/// Name from a manifest's metadata, which the builder always sets.
fn manifest_name(name: Option<&String>) -> ClusterResult<&str> {
    name.map(String::as_str)
        .ok_or_else(|| ClusterError::Config("manifest has no metadata.name".to_string()))
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn create_workload(&self, spec: &Workload) -> ClusterResult<CreateOutcome> {
        let name = manifest_name(spec.metadata.name.as_ref())?;
        let result = self
            .bounded(self.pods.create(&PostParams::default(), spec))
            .await
            .map(|_| ());
        classify_create("workload", name, result)
    }

    async fn create_exposure(&self, spec: &Exposure) -> ClusterResult<CreateOutcome> {
        let name = manifest_name(spec.metadata.name.as_ref())?;
        let result = self
            .bounded(self.services.create(&PostParams::default(), spec))
            .await
            .map(|_| ());
        classify_create("exposure", name, result)
    }

    async fn delete_workload(&self, name: &str) -> ClusterResult<DeleteOutcome> {
        let result = self
            .bounded(self.pods.delete(name, &DeleteParams::default()))
            .await
            .map(|_| ());
        classify_delete("workload", name, result)
    }

    async fn delete_exposure(&self, name: &str) -> ClusterResult<DeleteOutcome> {
        let result = self
            .bounded(self.services.delete(name, &DeleteParams::default()))
            .await
            .map(|_| ());
        classify_delete("exposure", name, result)
    }

    async fn await_workload_gone(&self, name: &str) -> ClusterResult<()> {
        let Some(pod) = self.bounded(self.pods.get_opt(name)).await? else {
            return Ok(());
        };
        let uid = pod.metadata.uid.unwrap_or_default();
        debug!(name, %uid, "waiting for workload to terminate");

        let gone = await_condition(self.pods.clone(), name, conditions::is_deleted(&uid));
        match tokio::time::timeout(self.deletion_timeout, gone).await {
            Ok(Ok(_)) => {
                info!(name, "workload terminated");
                Ok(())
            }
            Ok(Err(e)) => Err(ClusterError::Transport(e.to_string())),
            Err(_) => Err(ClusterError::Timeout(self.deletion_timeout)),
        }
    }

    async fn read_logs(&self, name: &str) -> ClusterResult<String> {
        let params = LogParams {
            tail_lines: Some(LOG_TAIL_LINES),
            ..LogParams::default()
        };
        self.bounded(self.pods.logs(name, &params)).await
    }
}
