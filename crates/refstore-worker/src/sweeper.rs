//! Periodic sweeps: delayed-request promotion and group reconciliation.
//!
//! Shutdown: [`SweepWorker::shutdown`] signals both loops to stop; it does
//! not wait for an in-flight cycle. Cycles are idempotent, so interrupting
//! one is safe.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use refstore_core::EngineConfig;
use refstore_services::{GroupTracker, StatusEngine};

#[derive(Clone, Debug)]
pub struct SweepWorkerConfig {
    /// Interval between delayed-request promotion sweeps.
    pub sweep_interval: Duration,
    /// Interval between group-completion reconciliation runs.
    pub group_check_interval: Duration,
}

impl Default for SweepWorkerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(30),
            group_check_interval: Duration::from_secs(60),
        }
    }
}

impl From<&EngineConfig> for SweepWorkerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            group_check_interval: Duration::from_secs(config.group_check_interval_secs),
        }
    }
}

pub struct SweepWorker {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweepWorker {
    /// Spawn both sweep loops. Errors inside a cycle are logged and the loop
    /// continues; only a shutdown signal stops it.
    pub fn start(
        status_engine: Arc<StatusEngine>,
        tracker: Arc<GroupTracker>,
        config: SweepWorkerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tracing::info!(
            sweep_interval_secs = config.sweep_interval.as_secs(),
            group_check_interval_secs = config.group_check_interval.as_secs(),
            "Starting sweep worker"
        );

        tokio::spawn(Self::run(status_engine, tracker, config, shutdown_rx));

        Self { shutdown_tx }
    }

    async fn run(
        status_engine: Arc<StatusEngine>,
        tracker: Arc<GroupTracker>,
        config: SweepWorkerConfig,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut sweep_tick = interval(config.sweep_interval);
        let mut group_tick = interval(config.group_check_interval);

        loop {
            tokio::select! {
                _ = sweep_tick.tick() => {
                    if let Err(e) = status_engine.check_delayed_storage_requests().await {
                        tracing::error!(error = %e, "Delayed storage request sweep failed");
                    }
                }
                _ = group_tick.tick() => {
                    if let Err(e) = tracker.check_request_groups().await {
                        tracing::error!(error = %e, "Request group reconciliation failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Sweep worker shutting down");
                    break;
                }
            }
        }
    }

    /// Signal the loops to stop.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            tracing::debug!("Sweep worker already stopped");
        }
    }
}
