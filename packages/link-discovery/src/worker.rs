//! Background loop driving the orchestrator.
//!
//! ```text
//! DiscoveryWorker
//!     │
//!     ├─► every poll_interval:    process_next (skipped while busy)
//!     └─► every cleanup_interval: run_cleanup (best-effort)
//! ```
//!
//! Shutdown is only observed between ticks; an in-flight request runs to
//! completion.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::DiscoveryOrchestrator;

/// `tokio::time::interval` panics on a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct DiscoveryWorker {
    orchestrator: Arc<DiscoveryOrchestrator>,
}

impl DiscoveryWorker {
    pub fn new(orchestrator: Arc<DiscoveryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Run on a background task until `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let config = self.orchestrator.config();
        info!(
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            cleanup_interval_secs = config.cleanup_interval.as_secs(),
            "discovery worker starting"
        );

        let mut poll = tokio::time::interval(config.poll_interval.max(MIN_INTERVAL));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cleanup = tokio::time::interval(config.cleanup_interval.max(MIN_INTERVAL));
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);
        cleanup.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = poll.tick() => {
                    if let Some(session_id) = self.orchestrator.process_next().await {
                        debug!(session_id = %session_id, "discovery tick processed a request");
                    }
                }
                _ = cleanup.tick() => {
                    self.orchestrator.run_cleanup().await;
                }
            }
        }

        info!("discovery worker stopped");
        Ok(())
    }
}
