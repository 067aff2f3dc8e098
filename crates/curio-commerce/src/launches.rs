//! Scheduled product launches.
//!
//! The storefront periodically re-checks which scheduled products have gone
//! live. The watcher runs beside the checkout and only publishes what it
//! sees; it holds no handle to the cart or the checkout session.

use crate::ids::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A product that becomes purchasable at `launch_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledLaunch {
    pub product_id: ProductId,
    pub name: String,
    pub launch_at: DateTime<Utc>,
}

/// Every scheduled launch, kept in launch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchSchedule {
    launches: Vec<ScheduledLaunch>,
}

impl LaunchSchedule {
    pub fn new(mut launches: Vec<ScheduledLaunch>) -> Self {
        launches.sort_by(|a, b| {
            a.launch_at
                .cmp(&b.launch_at)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        Self { launches }
    }

    pub fn launches(&self) -> &[ScheduledLaunch] {
        &self.launches
    }

    pub fn is_empty(&self) -> bool {
        self.launches.is_empty()
    }

    /// Launches live at `now`.
    pub fn live_at(&self, now: DateTime<Utc>) -> Vec<ScheduledLaunch> {
        self.launches
            .iter()
            .filter(|l| l.launch_at <= now)
            .cloned()
            .collect()
    }

    /// Launches that went live in `(after, upto]`.
    pub fn launched_between(&self, after: DateTime<Utc>, upto: DateTime<Utc>) -> Vec<ScheduledLaunch> {
        self.launches
            .iter()
            .filter(|l| l.launch_at > after && l.launch_at <= upto)
            .cloned()
            .collect()
    }

    /// The first launch still in the future.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<&ScheduledLaunch> {
        self.launches.iter().find(|l| l.launch_at > now)
    }
}

/// Background task that republishes the live launches on a fixed interval.
pub struct LaunchWatcher {
    rx: watch::Receiver<Vec<ScheduledLaunch>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl LaunchWatcher {
    /// Start watching against the wall clock.
    pub fn spawn(schedule: LaunchSchedule, interval: Duration) -> Self {
        Self::spawn_with_clock(schedule, interval, Utc::now)
    }

    /// Start watching with an injected clock.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn_with_clock<C>(schedule: LaunchSchedule, interval: Duration, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + Send + 'static,
    {
        let mut last_check = clock();
        let (tx, rx) = watch::channel(schedule.live_at(last_check));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            info!(
                launches = schedule.launches().len(),
                interval_ms = interval.as_millis() as u64,
                "launch watcher started"
            );
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the initial state is already published.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = clock();
                        let fresh = schedule.launched_between(last_check, now);
                        for launch in &fresh {
                            info!(product_id = %launch.product_id, name = %launch.name, "product launched");
                        }
                        if fresh.is_empty() {
                            debug!("no new launches");
                        } else {
                            tx.send_replace(schedule.live_at(now));
                        }
                        last_check = now;
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
            info!("launch watcher stopped");
        });

        Self {
            rx,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Receive the live launches whenever they change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ScheduledLaunch>> {
        self.rx.clone()
    }

    pub fn live(&self) -> Vec<ScheduledLaunch> {
        self.rx.borrow().clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl Drop for LaunchWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
