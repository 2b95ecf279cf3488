//! Single-slot handoff from the refresher to the renderer.
//!
//! Backed by a `watch` channel: a publish replaces whatever the renderer has
//! not looked at yet, so it only ever sees the newest complete snapshot.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::watch;

use crate::model::Snapshot;

/// Set when the latest refresh failed and the shown snapshot is old.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Staleness {
    pub reason: String,
    /// When refreshes started failing.
    pub since: SystemTime,
}

#[derive(Clone, Debug, Default)]
pub struct FeedState {
    pub snapshot: Option<Arc<Snapshot>>,
    pub stale: Option<Staleness>,
}

pub struct SnapshotFeed {
    tx: watch::Sender<FeedState>,
}

#[derive(Clone)]
pub struct FeedReader {
    rx: watch::Receiver<FeedState>,
}

pub fn channel() -> (SnapshotFeed, FeedReader) {
    let (tx, rx) = watch::channel(FeedState::default());
    (SnapshotFeed { tx }, FeedReader { rx })
}

impl SnapshotFeed {
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(FeedState {
            snapshot: Some(Arc::new(snapshot)),
            stale: None,
        });
    }

    /// Keeps the current snapshot and flags it as stale.
    pub fn mark_stale(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.tx.send_modify(|state| {
            let since = state
                .stale
                .as_ref()
                .map(|s| s.since)
                .unwrap_or_else(SystemTime::now);
            state.stale = Some(Staleness { reason, since });
        });
    }

    pub fn has_readers(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn current(&self) -> FeedState {
        self.tx.borrow().clone()
    }
}

impl FeedReader {
    /// The most recently published state, marking it as seen.
    pub fn latest(&mut self) -> FeedState {
        self.rx.borrow_and_update().clone()
    }

    /// True when something was published since the last `latest()`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next publish. Errors once the feed is dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
