//! Orchestrator: drives services through their lifecycle.
//!
//! Every operation loads the persisted [`Service`], holds the per-label lock
//! for its whole duration, talks to the cluster and the route registrar, and
//! saves the resulting state. Remote calls are idempotent, so retrying a
//! failed `start` or `stop` converges.

use std::sync::Arc;

use tracing::{debug, info, warn};

use spawnhub_cluster::ClusterApi;
use spawnhub_core::{
    epoch_secs, ClusterConfig, HubConfig, ImageDescriptor, Service, ServiceState, TransitionError,
};
use spawnhub_proxy::{RouteRegistrar, RouteTarget};
use spawnhub_state::ServiceRepository;
use spawnhub_workload::{ComposeError, VolumeComposer, WorkloadSpecBuilder, WorkloadSpecs};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::locks::LabelLocks;
use crate::logs::extract_message;

pub struct Orchestrator {
    repo: Arc<dyn ServiceRepository>,
    cluster: Arc<dyn ClusterApi>,
    routes: Arc<dyn RouteRegistrar>,
    composer: VolumeComposer,
    builder: WorkloadSpecBuilder,
    cluster_config: ClusterConfig,
    images: Vec<ImageDescriptor>,
    locks: LabelLocks,
}

impl Orchestrator {
    pub fn new(
        config: &HubConfig,
        repo: Arc<dyn ServiceRepository>,
        cluster: Arc<dyn ClusterApi>,
        routes: Arc<dyn RouteRegistrar>,
    ) -> Self {
        Self {
            repo,
            cluster,
            routes,
            composer: VolumeComposer::new(config.spawner.clone()),
            builder: WorkloadSpecBuilder::new(config),
            cluster_config: config.cluster.clone(),
            images: config.images.clone(),
            locks: LabelLocks::new(),
        }
    }

    /// Store a service description. An existing record keeps its state and
    /// last observation; a running service whose description changed is
    /// flagged `NeedRestart`.
    pub async fn register(&self, mut service: Service) -> OrchestratorResult<Service> {
        let _guard = self.locks.acquire(&service.label).await;
        self.image(&service.image)?;
        if let Some(existing) = self.repo.get(&service.label)? {
            let changed = existing.clone().redescribe(service.clone()) != existing;
            service = existing.redescribe(service);
            if changed && service.state() == ServiceState::Running {
                service.transition(ServiceState::NeedRestart)?;
                info!(label = %service.label, "description changed, service needs restart");
            }
        }
        self.repo.save(&service)?;
        debug!(label = %service.label, state = %service.state(), "service registered");
        Ok(service)
    }

    pub fn get(&self, label: &str) -> OrchestratorResult<Service> {
        self.repo
            .get(label)?
            .ok_or_else(|| OrchestratorError::ServiceNotFound(label.to_string()))
    }

    pub fn list(&self) -> OrchestratorResult<Vec<Service>> {
        Ok(self.repo.list()?)
    }

    /// Manifests `start` would submit for a stored service.
    pub fn render(&self, label: &str) -> OrchestratorResult<WorkloadSpecs> {
        let service = self.get(label)?;
        let image = self.image(&service.image)?;
        let volumes = self.composer.compose(&service, image)?;
        Ok(self.builder.build(&service, image, &volumes)?)
    }

    /// Bring a service up: exposure, then workload, then route.
    ///
    /// Starting a running service re-submits everything and succeeds.
    /// Services in `NeedRestart` or `Error` must be stopped first.
    pub async fn start(&self, label: &str) -> OrchestratorResult<Service> {
        let _guard = self.locks.acquire(label).await;
        let mut service = self.get(label)?;
        self.start_locked(&mut service).await?;
        Ok(service)
    }

    async fn start_locked(&self, service: &mut Service) -> OrchestratorResult<()> {
        let label = service.label.clone();
        if !service.state().can_transition_to(ServiceState::Running) {
            return Err(OrchestratorError::InvalidState(TransitionError {
                label,
                from: service.state(),
                to: ServiceState::Running,
            }));
        }

        let image = self.image(&service.image)?;
        let volumes = self.composer.compose(service, image)?;
        let specs = self.builder.build(service, image, &volumes)?;

        let exposure = self.cluster.create_exposure(&specs.exposure).await?;
        let workload = match self.cluster.create_workload(&specs.workload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%label, error = %e, "workload creation failed, exposure left for retry");
                return Err(e.into());
            }
        };

        match self.route_target(service) {
            Some(target) => self.routes.add_route(&label, &target).await?,
            None => debug!(%label, "no proxies declared, skipping route"),
        }

        service.transition(ServiceState::Running)?;
        self.repo.save(service)?;
        info!(%label, ?exposure, ?workload, "service started");
        Ok(())
    }

    /// Tear a service down: route, then workload, then exposure.
    ///
    /// Route removal is best effort. Stopping an absent service succeeds.
    pub async fn stop(&self, label: &str) -> OrchestratorResult<Service> {
        let _guard = self.locks.acquire(label).await;
        let mut service = self.get(label)?;
        self.stop_locked(&mut service).await?;
        Ok(service)
    }

    async fn stop_locked(&self, service: &mut Service) -> OrchestratorResult<()> {
        let label = service.label.clone();
        if let Err(e) = self.routes.remove_route(&label).await {
            warn!(%label, error = %e, "route removal failed, continuing teardown");
        }
        let workload = self.cluster.delete_workload(&label).await?;
        let exposure = self.cluster.delete_exposure(&label).await?;

        service.transition(ServiceState::NotPresent)?;
        self.repo.save(service)?;
        info!(%label, ?workload, ?exposure, "service stopped");
        Ok(())
    }

    /// Refresh a service's status message from its workload logs.
    ///
    /// A failed log read on a live service moves it to `Error`. The
    /// observation is saved in every case; cluster failures are never
    /// returned to the caller.
    pub async fn check(&self, label: &str) -> OrchestratorResult<Service> {
        let _guard = self.locks.acquire(label).await;
        let mut service = self.get(label)?;

        let message = match self.cluster.read_logs(label).await {
            Ok(raw) => extract_message(&raw),
            Err(e) => {
                let message = e.message();
                match service.state() {
                    state if state.is_live() => {
                        warn!(%label, %state, error = %e, "health check failed, marking error");
                        service.transition(ServiceState::Error)?;
                    }
                    ServiceState::NotPresent => {
                        debug!(%label, %message, "no workload to check");
                    }
                    state => debug!(%label, %state, %message, "health check failed"),
                }
                message
            }
        };

        service.observe(message, epoch_secs());
        self.repo.save(&service)?;
        Ok(service)
    }

    /// Flag a running service whose description changed since it started.
    /// Services in any other state are returned unchanged.
    pub async fn mark_need_restart(&self, label: &str) -> OrchestratorResult<Service> {
        let _guard = self.locks.acquire(label).await;
        let mut service = self.get(label)?;
        if service.state() != ServiceState::Running {
            debug!(%label, state = %service.state(), "not running, nothing to flag");
            return Ok(service);
        }
        service.transition(ServiceState::NeedRestart)?;
        self.repo.save(&service)?;
        info!(%label, "service needs restart");
        Ok(service)
    }

    /// Stop then start, under one hold of the label lock.
    ///
    /// The old workload must have finished terminating before the new one
    /// is created; otherwise the create hits the terminating workload.
    pub async fn restart(&self, label: &str) -> OrchestratorResult<Service> {
        let _guard = self.locks.acquire(label).await;
        let mut service = self.get(label)?;
        self.stop_locked(&mut service).await?;
        self.cluster.await_workload_gone(label).await?;
        self.start_locked(&mut service).await?;
        Ok(service)
    }

    /// Stop a service and forget it.
    pub async fn reap(&self, label: &str) -> OrchestratorResult<()> {
        let _guard = self.locks.acquire(label).await;
        let mut service = self.get(label)?;
        self.stop_locked(&mut service).await?;
        self.repo.remove(label)?;
        info!(%label, "service reaped");
        Ok(())
    }

    fn image(&self, name: &str) -> OrchestratorResult<&ImageDescriptor> {
        self.images
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| ComposeError::UnknownImage(name.to_string()).into())
    }

    fn route_target(&self, service: &Service) -> Option<RouteTarget> {
        let port = service.primary_port()?;
        Some(RouteTarget::new(
            &self.cluster_config.exposure_host(&service.label),
            port,
        ))
    }
}
