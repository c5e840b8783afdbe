//! Periodic refresh driver.

use std::{future::Future, time::Duration};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Handle to a running scheduler. Cancelling stops future ticks; cycles
/// already spawned run to completion.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    token: CancellationToken,
}

impl SchedulerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Runs `cycle` immediately and then every `period` until cancelled.
    ///
    /// Every run is spawned as its own task, so a slow cycle never delays the
    /// next tick and two cycles may overlap.
    pub fn start<F, Fut>(period: Duration, cycle: F) -> SchedulerHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let stop = token.clone();

        tokio::spawn(async move {
            // The first tick completes immediately.
            let mut ticks = interval(period.max(Duration::from_millis(1)));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticks.tick() => {
                        tracing::debug!("Scheduled weather refresh");
                        tokio::spawn(cycle());
                    }
                }
            }
            tracing::debug!("Refresh scheduler stopped");
        });

        SchedulerHandle { token }
    }
}
