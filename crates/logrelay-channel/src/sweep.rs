//! Periodic eviction of reclaimable channels.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::registry::ChannelRegistry;

/// Default sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running sweep loop.
///
/// The loop stops when its token is cancelled, either through
/// [`SweepTask::shutdown`] or by the owner cancelling a parent token.
#[derive(Debug)]
pub struct SweepTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweepTask {
    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The first pass runs one full `period` after spawning.
    pub fn spawn(
        registry: Arc<ChannelRegistry>,
        period: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.sweep();
                        debug!(evicted = evicted.len(), remaining = registry.len(), "sweep pass complete");
                    }
                }
            }
            debug!("sweep task stopped");
        });

        Self { cancel, handle }
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            warn!(error = %err, "sweep task ended abnormally");
        }
    }
}
