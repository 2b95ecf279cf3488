use std::sync::Arc;
use std::time::{Instant, SystemTime};

use futures_util::{StreamExt, stream};
use tracing::debug;

use crate::error::ListUnavailable;
use crate::frame::decode_stream;
use crate::metrics;
use crate::model::{ContainerLogs, ContainerRecord, ContainerSummary, HostInfo, Snapshot};
use crate::runtime::{HostSource, LogOptions, RuntimeClient};

pub const DEFAULT_WORKERS: usize = 8;

/// Builds one [`Snapshot`] per call from the runtime and the host.
///
/// Per-container fetches run concurrently, at most `workers` at a time, and
/// are joined before the snapshot is assembled. A failing container degrades
/// on its own; only a failed list call aborts the cycle.
pub struct Aggregator {
    runtime: Arc<dyn RuntimeClient>,
    host: Arc<dyn HostSource>,
    workers: usize,
    log_options: LogOptions,
}

impl Aggregator {
    pub fn new(runtime: Arc<dyn RuntimeClient>, host: Arc<dyn HostSource>) -> Self {
        Self {
            runtime,
            host,
            workers: DEFAULT_WORKERS,
            log_options: LogOptions::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_log_options(mut self, opts: LogOptions) -> Self {
        self.log_options = opts;
        self
    }

    pub fn runtime_name(&self) -> &'static str {
        self.runtime.name()
    }

    pub async fn collect(&self) -> Result<Snapshot, ListUnavailable> {
        let started = Instant::now();
        let listed = self.runtime.list_containers().await?;
        let count = listed.len();

        // `buffered` keeps list order regardless of completion order.
        let containers: Vec<ContainerRecord> = stream::iter(listed)
            .map(|summary| self.collect_one(summary))
            .buffered(self.workers)
            .collect()
            .await;

        let snapshot = Snapshot::new(containers, self.read_host(), SystemTime::now());
        debug!(
            runtime = self.runtime.name(),
            containers = count,
            log_lines = snapshot.flat_logs.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot collected"
        );
        Ok(snapshot)
    }

    async fn collect_one(&self, summary: ContainerSummary) -> ContainerRecord {
        let (stat, logs) = tokio::join!(
            self.runtime.fetch_stat_counters(&summary.id),
            self.fetch_logs(&summary.id),
        );
        ContainerRecord::new(summary, metrics::sample_or_unavailable(stat), logs)
    }

    async fn fetch_logs(&self, id: &str) -> ContainerLogs {
        let decoded = match self.runtime.fetch_log_stream(id, &self.log_options).await {
            Ok(stream) => decode_stream(stream).await,
            Err(e) => Err(e),
        };
        match decoded {
            Ok(decoded) => decoded.into_logs(),
            Err(e) => {
                debug!(id = %e.id, reason = %e.reason, "log fetch failed");
                ContainerLogs::Unavailable
            }
        }
    }

    fn read_host(&self) -> HostInfo {
        let mem = self.host.memory_totals();
        HostInfo {
            cpu_count: self.host.core_count(),
            mem_total: mem.total,
            mem_free: mem.free,
        }
    }
}
