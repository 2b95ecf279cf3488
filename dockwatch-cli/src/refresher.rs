use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

use dockwatch_core::aggregate::Aggregator;
use dockwatch_core::error::RefreshError;
use dockwatch_core::feed::SnapshotFeed;
use dockwatch_core::model::Snapshot;

/// Drives the aggregator on a fixed interval and hands results to the feed.
pub struct Refresher {
    aggregator: Aggregator,
    interval: Duration,
    deadline: Duration,
}

impl Refresher {
    pub fn new(aggregator: Aggregator, interval: Duration, deadline: Duration) -> Self {
        Self {
            aggregator,
            interval,
            deadline,
        }
    }

    /// One full cycle, bounded by the deadline.
    pub async fn refresh_once(&self) -> Result<Snapshot, RefreshError> {
        match timeout(self.deadline, self.aggregator.collect()).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(RefreshError::TimedOut {
                after: self.deadline,
            }),
        }
    }

    pub async fn run(self, feed: SnapshotFeed) {
        let mut interval = tokio::time::interval(self.interval);
        // A slow cycle should not be followed by a burst of catch-up cycles.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            runtime = self.aggregator.runtime_name(),
            interval_ms = self.interval.as_millis() as u64,
            deadline_ms = self.deadline.as_millis() as u64,
            "refresher started"
        );

        loop {
            // First tick completes immediately, giving an initial snapshot.
            interval.tick().await;
            if !feed.has_readers() {
                debug!("no readers left, refresher stopping");
                break;
            }

            match self.refresh_once().await {
                Ok(snapshot) => feed.publish(snapshot),
                Err(e) => {
                    warn!(error = %e, "refresh failed, keeping last snapshot");
                    feed.mark_stale(e.to_string());
                }
            }
        }
    }
}

pub fn spawn_refresher(refresher: Refresher, feed: SnapshotFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        refresher.run(feed).await;
    })
}
