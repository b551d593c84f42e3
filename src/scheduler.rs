//! Periodic refresh loop.
//!
//! Each tick runs one full cycle: refresh, publish, write outputs. A failed
//! cycle is logged and retried on the next tick; there is no retry inside a
//! cycle.

use crate::api::{Endpoints, Transport};
use crate::batch::BatchConfig;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::Snapshot;
use crate::outputs::{self, OutputDirs};
use crate::store::SnapshotStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument, warn};

pub struct Scheduler<T> {
    transport: Arc<T>,
    endpoints: Endpoints,
    batch: BatchConfig,
    interval: Duration,
    outputs: OutputDirs,
    store: Arc<SnapshotStore>,
}

impl<T> Scheduler<T>
where
    T: Transport + 'static,
{
    pub fn new(transport: Arc<T>, config: &Config, store: Arc<SnapshotStore>) -> Self {
        Self {
            transport,
            endpoints: config.endpoints(),
            batch: config.batch(),
            interval: config.refresh_interval(),
            outputs: config.outputs(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Refresh once, publish on success, then hand the snapshot to the
    /// output sinks.
    ///
    /// A failing sink is logged but does not fail the cycle: the snapshot is
    /// already published by then.
    #[instrument(level = "info", skip_all)]
    pub async fn run_cycle(&self) -> Result<Arc<Snapshot>, FetchError> {
        let snapshot = self
            .store
            .refresh_and_publish(&self.transport, &self.endpoints, self.batch)
            .await?;

        if self.outputs.is_empty() {
            for (rank, story) in snapshot.stories.iter().enumerate() {
                info!(rank = rank + 1, id = story.id, score = story.score, domain = %story.domain, title = %story.title, "Story");
            }
        } else {
            let failed = outputs::write_all(&snapshot, &self.outputs).await;
            if failed > 0 {
                warn!(
                    failed,
                    stories = snapshot.len(),
                    "Snapshot published but some outputs could not be written"
                );
            }
        }
        Ok(snapshot)
    }

    /// Run cycles on the configured interval until `shutdown` resolves.
    ///
    /// The first cycle starts immediately. Shutdown is only observed between
    /// cycles, so a running batch always completes. Returns the number of
    /// cycles started.
    pub async fn run<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0usize;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(cycles, "Shutdown requested; stopping refresh loop");
                    break;
                }
                _ = ticker.tick() => {}
            }

            cycles += 1;
            info!(cycle = cycles, "Fetching new stories");
            if let Err(e) = self.run_cycle().await {
                error!(cycle = cycles, kind = %e.kind(), error = %e, "Could not fetch top stories");
            }
        }
        cycles
    }
}
