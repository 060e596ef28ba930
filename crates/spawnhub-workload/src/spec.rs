//! Workload spec builder: renders the Pod and Service manifests.
//!
//! The workload is a single-container Pod named after the service label.
//! The exposure is a Service selecting that Pod with one port per proxy.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar as KubeEnvVar, PersistentVolumeClaimVolumeSource, Pod,
    PodSpec, Service as KubeService, ServicePort, ServiceSpec, Volume,
    VolumeMount as KubeVolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::debug;

use spawnhub_core::{
    ClaimNames, ClusterConfig, EnvVar, HubConfig, ImageDescriptor, Service, SpawnerConfig,
};

use crate::error::{ComposeError, ComposeResult};
use crate::volumes::{ClaimClass, ComposedVolumes, VolumeComposer};

/// The scheduled execution unit.
pub type Workload = Pod;

/// The network object fronting a workload.
pub type Exposure = KubeService;

/// Name of the primary port; later ports append their number.
const PORT_NAME: &str = "http";

/// Manifests for one service.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpecs {
    pub workload: Workload,
    pub exposure: Exposure,
}

/// Renders manifests from a service, its image and composed volumes.
#[derive(Debug, Clone)]
pub struct WorkloadSpecBuilder {
    spawner: SpawnerConfig,
    claims: ClaimNames,
    cluster: ClusterConfig,
}

impl WorkloadSpecBuilder {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            spawner: config.spawner.clone(),
            claims: config.claims.clone(),
            cluster: config.cluster.clone(),
        }
    }

    /// Compose volumes and build both manifests in one step.
    pub fn render(&self, service: &Service, image: &ImageDescriptor) -> ComposeResult<WorkloadSpecs> {
        let volumes = VolumeComposer::new(self.spawner.clone()).compose(service, image)?;
        self.build(service, image, &volumes)
    }

    pub fn build(
        &self,
        service: &Service,
        image: &ImageDescriptor,
        volumes: &ComposedVolumes,
    ) -> ComposeResult<WorkloadSpecs> {
        if service.label.is_empty() {
            return Err(ComposeError::Missing("service.label"));
        }
        if image.name.is_empty() {
            return Err(ComposeError::Missing("image.name"));
        }
        for (i, proxy) in service.proxies.iter().enumerate() {
            if service.proxies[..i].iter().any(|p| p.port == proxy.port) {
                return Err(ComposeError::DuplicatePort(proxy.port));
            }
        }

        let specs = WorkloadSpecs {
            workload: self.workload(service, image, volumes),
            exposure: self.exposure(service),
        };
        debug!(
            label = %service.label,
            image = %image.name,
            ports = service.proxies.len(),
            "workload specs built"
        );
        Ok(specs)
    }

    fn workload(
        &self,
        service: &Service,
        image: &ImageDescriptor,
        volumes: &ComposedVolumes,
    ) -> Workload {
        let ports = service
            .proxies
            .iter()
            .enumerate()
            .map(|(i, proxy)| ContainerPort {
                container_port: i32::from(proxy.port),
                name: Some(port_name(i, proxy.port)),
                protocol: Some("TCP".to_string()),
                ..ContainerPort::default()
            })
            .collect();

        let volume_mounts = volumes
            .mounts
            .iter()
            .map(|mount| KubeVolumeMount {
                name: self.volume_name(mount.claim),
                mount_path: mount.mount_path.clone(),
                sub_path: Some(mount.sub_path.clone()),
                read_only: mount.read_only.then_some(true),
                ..KubeVolumeMount::default()
            })
            .collect();

        let claim_volumes = volumes
            .claims()
            .into_iter()
            .map(|class| Volume {
                name: self.volume_name(class),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: self.claim_name(class).to_string(),
                    read_only: None,
                }),
                ..Volume::default()
            })
            .collect();

        let env = self
            .environment(service)
            .into_iter()
            .map(|var| KubeEnvVar {
                name: var.name,
                value: Some(var.value),
                ..KubeEnvVar::default()
            })
            .collect();

        Pod {
            metadata: ObjectMeta {
                name: Some(service.label.clone()),
                namespace: Some(self.cluster.namespace.clone()),
                labels: Some(self.selector(&service.label)),
                ..ObjectMeta::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: service.label.clone(),
                    image: Some(image.name.clone()),
                    image_pull_policy: Some(self.spawner.image_pull_policy.clone()),
                    ports: Some(ports),
                    env: Some(env),
                    volume_mounts: Some(volume_mounts),
                    ..Container::default()
                }],
                volumes: Some(claim_volumes),
                ..PodSpec::default()
            }),
            status: None,
        }
    }

    fn exposure(&self, service: &Service) -> Exposure {
        let ports = service
            .proxies
            .iter()
            .enumerate()
            .map(|(i, proxy)| ServicePort {
                name: Some(port_name(i, proxy.port)),
                port: i32::from(proxy.port),
                target_port: Some(IntOrString::Int(i32::from(proxy.port))),
                protocol: Some("TCP".to_string()),
                ..ServicePort::default()
            })
            .collect();

        KubeService {
            metadata: ObjectMeta {
                name: Some(service.label.clone()),
                namespace: Some(self.cluster.namespace.clone()),
                ..ObjectMeta::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(self.selector(&service.label)),
                ports: Some(ports),
                ..ServiceSpec::default()
            }),
            status: None,
        }
    }

    /// Base variables followed by the service's own pairs.
    ///
    /// A service pair with the name of a base variable replaces it in place.
    fn environment(&self, service: &Service) -> Vec<EnvVar> {
        let mut env = vec![
            EnvVar::new("LANG", &self.spawner.locale),
            EnvVar::new("PREFIX", &self.spawner.name_prefix),
            EnvVar::new(
                "SSH_AUTH_SOCK",
                &format!(
                    "{}/{}",
                    self.spawner.ssh_auth_sock_dir.trim_end_matches('/'),
                    service.username
                ),
            ),
        ];
        for var in &service.env {
            match env.iter_mut().find(|existing| existing.name == var.name) {
                Some(existing) => existing.value = var.value.clone(),
                None => env.push(var.clone()),
            }
        }
        env
    }

    fn selector(&self, label: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(self.cluster.selector_key.clone(), format!("lbl-{label}"))])
    }

    fn volume_name(&self, class: ClaimClass) -> String {
        format!("{}-{}", self.spawner.volume_prefix, class)
    }

    fn claim_name(&self, class: ClaimClass) -> &str {
        match class {
            ClaimClass::Home => &self.claims.home,
            ClaimClass::Project => &self.claims.project,
            ClaimClass::Report => &self.claims.report,
            ClaimClass::Cache => &self.claims.cache,
        }
    }
}

/// Port names must be unique per pod, so only the primary port is bare `http`.
fn port_name(index: usize, port: u16) -> String {
    if index == 0 {
        PORT_NAME.to_string()
    } else {
        format!("{PORT_NAME}-{port}")
    }
}
