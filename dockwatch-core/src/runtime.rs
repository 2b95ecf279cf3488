use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{FetchFailure, ListUnavailable};
use crate::metrics::StatCounters;
use crate::model::ContainerSummary;

/// Raw multiplexed log bytes, chunked however the transport delivers them.
pub type LogStream = BoxStream<'static, Result<Bytes, FetchFailure>>;

/// Options for a one-shot log fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Number of trailing lines, or "all".
    pub tail: String,
    pub timestamps: bool,
    pub show_stdout: bool,
    pub show_stderr: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            tail: "50".to_string(),
            timestamps: true,
            show_stdout: true,
            show_stderr: true,
        }
    }
}

/// Read-only view of a container runtime.
///
/// Implementations:
/// - `DockerRuntime`: talks to the local Docker daemon
/// - `DemoRuntime`: synthetic containers for demos and offline use
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Lists running containers.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, ListUnavailable>;

    /// Reads one pair of current/previous CPU counters and current memory.
    async fn fetch_stat_counters(&self, id: &str) -> Result<StatCounters, FetchFailure>;

    /// Opens a finite log stream ending after the requested tail.
    async fn fetch_log_stream(&self, id: &str, opts: &LogOptions)
    -> Result<LogStream, FetchFailure>;

    fn name(&self) -> &'static str;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryTotals {
    pub total: u64,
    pub free: u64,
}

/// Host figures, queried fresh every refresh.
pub trait HostSource: Send + Sync {
    fn core_count(&self) -> usize;
    fn memory_totals(&self) -> MemoryTotals;
}
