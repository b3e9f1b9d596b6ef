//! Periodic tick task.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::{IncidentRuntime, Inner};

/// Aborts the wrapped task when dropped.
pub(super) struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Tick every `interval` until stopped or the runtime is dropped.
pub(super) fn spawn_ticker(inner: Weak<Inner>, interval: Duration) -> AbortOnDrop {
    let period = interval.max(Duration::from_millis(1));
    AbortOnDrop(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else {
                debug!("runtime dropped; ticker exiting");
                break;
            };
            IncidentRuntime { inner }.tick().await;
        }
    }))
}
