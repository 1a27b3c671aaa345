use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::JobHandle;
use crate::platform::PlatformClient;

/// Counters of a finished spam loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpamStats {
    pub sweeps: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Re-sends one message to a fixed set of channels until its handle is stopped.
#[derive(Clone)]
pub struct SpamLoop {
    platform: Arc<dyn PlatformClient>,
}

impl SpamLoop {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }

    /// Sweep over `targets` in order, then sleep `interval`, while `handle` runs.
    ///
    /// Only one send is ever in flight. A failed send is logged and the sweep
    /// moves on to the next target.
    pub async fn run(
        &self,
        message: String,
        targets: Vec<u64>,
        handle: JobHandle,
        interval: Duration,
    ) -> SpamStats {
        let mut stats = SpamStats::default();
        info!(job_id = handle.id(), targets = targets.len(), "Spam loop started");

        'outer: while handle.is_running() {
            for &channel_id in &targets {
                if !handle.is_running() {
                    break 'outer;
                }
                match self.platform.send_message(channel_id, &message).await {
                    Ok(()) => stats.sent += 1,
                    Err(e) => {
                        stats.failed += 1;
                        warn!(job_id = handle.id(), channel_id, "Spam send failed: {}", e);
                    }
                }
            }
            stats.sweeps += 1;
            tokio::time::sleep(interval).await;
        }

        info!(
            job_id = handle.id(),
            sweeps = stats.sweeps,
            sent = stats.sent,
            failed = stats.failed,
            "Spam loop stopped"
        );
        stats
    }
}
