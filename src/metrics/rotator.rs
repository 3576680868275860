//! Background task that ages the bucketed series.

use crate::metrics::periodic::StatsWindows;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Handle to the running rotation loop.
pub struct Rotator {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Rotator {
    /// Spawn the loop on the current tokio runtime.
    ///
    /// Each tick samples the clock once and rotates all four resolutions
    /// against that instant.
    pub fn spawn(windows: Arc<StatsWindows>, every: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(interval = ?every, "Stats rotator started");

            while !stop.load(Ordering::Relaxed) {
                ticker.tick().await;
                windows.rotate(Utc::now());
            }
        });

        Self { shutdown, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop rotating. Pending ticks are abandoned.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.handle.abort();
        tracing::debug!("Stats rotator stopped");
    }
}
