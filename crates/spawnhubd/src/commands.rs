//! Subcommand handlers.
//!
//! `watch` owns the state store and the orchestrator and serves the control
//! API; every other command is a call to that API.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use spawnhub_api::{build_router, ApiClient};
use spawnhub_cluster::KubeCluster;
use spawnhub_core::{HubConfig, Service};
use spawnhub_orchestrator::{CheckMonitor, Orchestrator};
use spawnhub_proxy::HttpRouteRegistrar;
use spawnhub_state::ServiceStore;

pub fn load_config(path: &Path) -> anyhow::Result<HubConfig> {
    let config = HubConfig::from_file(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    info!(path = %path.display(), images = config.images.len(), "configuration loaded");
    Ok(config)
}

fn open_store(config: &HubConfig) -> anyhow::Result<ServiceStore> {
    let path = &config.state.path;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating state directory {}", dir.display()))?;
    }
    Ok(ServiceStore::open(path)?)
}

async fn orchestrator(config: &HubConfig) -> anyhow::Result<Orchestrator> {
    let store = open_store(config)?;
    let cluster = KubeCluster::connect(&config.cluster.namespace, config.cluster.request_timeout()?)
        .await
        .context("connecting to the cluster")?
        .with_deletion_timeout(config.cluster.deletion_timeout()?);
    let routes = HttpRouteRegistrar::new(&config.proxy)?;
    Ok(Orchestrator::new(
        config,
        Arc::new(store),
        Arc::new(cluster),
        Arc::new(routes),
    ))
}

fn client(config: &HubConfig) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::new(&config.daemon)?)
}

fn print_service(service: &Service) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(service)?);
    Ok(())
}

pub async fn apply(config: &HubConfig, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let service: Service =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
    let service = client(config)?.register(&service).await?;
    print_service(&service)
}

pub async fn start(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    print_service(&client(config)?.start(label).await?)
}

pub async fn stop(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    print_service(&client(config)?.stop(label).await?)
}

pub async fn check(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    print_service(&client(config)?.check(label).await?)
}

pub async fn restart(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    print_service(&client(config)?.restart(label).await?)
}

pub async fn mark_need_restart(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    print_service(&client(config)?.mark_need_restart(label).await?)
}

pub async fn reap(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    client(config)?.reap(label).await?;
    println!("reaped {label}");
    Ok(())
}

pub async fn list(config: &HubConfig) -> anyhow::Result<()> {
    let services = client(config)?.list().await?;
    for line in format_listing(&services) {
        println!("{line}");
    }
    Ok(())
}

fn format_listing(services: &[Service]) -> Vec<String> {
    let mut lines = vec![format!("{:<24} {:<14} {:<32} MESSAGE", "LABEL", "STATE", "IMAGE")];
    for s in services {
        lines.push(format!(
            "{:<24} {:<14} {:<32} {}",
            s.label,
            s.state().as_str(),
            s.image,
            s.last_message.as_deref().unwrap_or("-")
        ));
    }
    lines
}

/// Manifests `start` would submit; nothing is sent to the cluster.
pub async fn render(config: &HubConfig, label: &str) -> anyhow::Result<()> {
    let manifests = client(config)?.render(label).await?;
    println!("{}", serde_json::to_string_pretty(&manifests["workload"])?);
    println!("{}", serde_json::to_string_pretty(&manifests["exposure"])?);
    Ok(())
}

/// Run the check monitor and serve the control API until Ctrl-C.
pub async fn watch(config: &HubConfig) -> anyhow::Result<()> {
    let interval = config.monitor.interval()?;
    let addr = config.daemon.listen_addr()?;
    let orchestrator = Arc::new(orchestrator(config).await?);
    let monitor = CheckMonitor::new(orchestrator.clone(), interval);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let monitor_handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding control API to {addr}"))?;
    info!(%addr, "control API listening");

    axum::serve(listener, build_router(orchestrator))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = monitor_handle.await;
    info!("spawnhub daemon stopped");
    Ok(())
}
