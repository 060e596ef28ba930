//! Check monitor: background task that periodically checks every service
//! that may have a workload.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use spawnhub_core::ServiceState;

use crate::error::OrchestratorResult;
use crate::orchestrator::Orchestrator;

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    /// Services that entered `Error` during this sweep.
    pub degraded: usize,
    /// Checks that could not complete (store failures, vanished records).
    pub failed: usize,
}

pub struct CheckMonitor {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
}

impl CheckMonitor {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Check every service not in `NotPresent` once.
    pub async fn sweep(&self) -> OrchestratorResult<SweepReport> {
        let mut report = SweepReport::default();
        for service in self.orchestrator.list()? {
            let before = service.state();
            if before == ServiceState::NotPresent {
                continue;
            }
            match self.orchestrator.check(&service.label).await {
                Ok(after) => {
                    report.checked += 1;
                    if before != ServiceState::Error && after.state() == ServiceState::Error {
                        report.degraded += 1;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(label = %service.label, error = %e, "check failed");
                }
            }
        }
        debug!(?report, "sweep finished");
        Ok(report)
    }

    /// Sweep on every tick until `shutdown` flips or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, "check monitor starting");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "sweep aborted");
                    }
                }
                _ = shutdown.changed() => {
                    debug!("check monitor shutting down");
                    break;
                }
            }
        }
    }
}
