use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::core::Coinsight;

/// Handle to the background cache sweep, health counter reset and popular
/// symbol refresh.
///
/// Dropping the handle stops the task; [`MaintenanceHandle::stop`] waits for it.
#[derive(Debug)]
pub struct MaintenanceHandle {
    join: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl MaintenanceHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    /// Return `true` once the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take()
            && !join.is_finished()
        {
            join.abort();
        }
    }
}

pub struct Schedule {
    pub sweep_every: Duration,
    pub max_age: Duration,
    pub reset_every: Duration,
    pub refresh_every: Duration,
    pub popular: Vec<String>,
}

/// All periods must be non-zero; the builder enforces it.
///
/// The popular refresh fires once immediately, then every `refresh_every`.
pub fn spawn(coinsight: Coinsight, schedule: Schedule) -> MaintenanceHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        let now = Instant::now();
        let mut sweep = interval_at(now + schedule.sweep_every, schedule.sweep_every);
        let mut reset = interval_at(now + schedule.reset_every, schedule.reset_every);
        let mut refresh = interval_at(now, schedule.refresh_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reset.set_missed_tick_behavior(MissedTickBehavior::Delay);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let popular = schedule.popular;
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = sweep.tick() => {
                    let removed = coinsight.sweep_cache(schedule.max_age);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(target: "coinsight::maintenance", removed, "cache sweep");
                    #[cfg(not(feature = "tracing"))]
                    let _ = removed;
                }
                _ = reset.tick() => {
                    coinsight.reset_health_counters();
                    #[cfg(feature = "tracing")]
                    tracing::info!(target: "coinsight::maintenance", "health counters reset");
                }
                _ = refresh.tick(), if !popular.is_empty() => {
                    tokio::select! {
                        _ = &mut stop_rx => break,
                        report = coinsight.warm(&popular) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(
                                target: "coinsight::maintenance",
                                fresh = report.fresh,
                                fetched = report.fetched,
                                failed = report.failed,
                                "popular symbols refreshed"
                            );
                            #[cfg(not(feature = "tracing"))]
                            let _ = report;
                        }
                    }
                }
            }
        }
    });
    MaintenanceHandle {
        join: Some(join),
        stop_tx: Some(stop_tx),
    }
}
