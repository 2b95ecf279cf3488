#![cfg(feature = "docker")]

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{ListContainersOptions, LogOutput, LogsOptions, StatsOptions};
use bytes::Bytes;
use futures_util::StreamExt;
use tracing::debug;

use dockwatch_core::error::{FetchFailure, ListUnavailable};
use dockwatch_core::frame::encode_frame;
use dockwatch_core::metrics::StatCounters;
use dockwatch_core::model::{ContainerSummary, StreamKind};
use dockwatch_core::runtime::{LogOptions, LogStream, RuntimeClient};

pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connects using `DOCKER_HOST` or the platform's default socket and
    /// verifies the daemon answers.
    pub async fn connect() -> Result<Self, bollard::errors::Error> {
        let client = Docker::connect_with_local_defaults()?;
        let version = client.version().await?;
        debug!(
            version = version.version.as_deref().unwrap_or("unknown"),
            api = version.api_version.as_deref().unwrap_or("unknown"),
            "connected to Docker"
        );
        Ok(Self { client })
    }
}

/// bollard hands back one `LogOutput` per frame; re-encode it so the shared
/// frame decoder stays the single path from bytes to lines.
fn reframe(output: LogOutput) -> Bytes {
    match output {
        LogOutput::StdErr { message } => encode_frame(StreamKind::Stderr, &message),
        LogOutput::StdOut { message }
        | LogOutput::StdIn { message }
        | LogOutput::Console { message } => encode_frame(StreamKind::Stdout, &message),
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, ListUnavailable> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let items = self
            .client
            .list_containers(Some(options))
            .await
            .map_err(ListUnavailable::new)?;

        Ok(items
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                status: c.status.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
                command: c.command.unwrap_or_default(),
                labels: c.labels.unwrap_or_default(),
                created_at: c.created.unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch_stat_counters(&self, id: &str) -> Result<StatCounters, FetchFailure> {
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };
        let mut stream = Box::pin(self.client.stats(id, Some(options)));
        let stats = stream
            .next()
            .await
            .ok_or_else(|| FetchFailure::new(id, "empty stats response"))?
            .map_err(|e| FetchFailure::new(id, e))?;

        let cpu = &stats.cpu_stats;
        let pre = &stats.precpu_stats;
        Ok(StatCounters {
            cur_total_usage: cpu.cpu_usage.total_usage,
            prev_total_usage: pre.cpu_usage.total_usage,
            cur_system_usage: cpu.system_cpu_usage.unwrap_or(0),
            prev_system_usage: pre.system_cpu_usage.unwrap_or(0),
            core_count: StatCounters::resolve_core_count(
                cpu.online_cpus,
                cpu.cpu_usage.percpu_usage.as_ref().map(Vec::len),
            ),
            mem_usage: stats.memory_stats.usage.unwrap_or(0),
        })
    }

    async fn fetch_log_stream(&self, id: &str, opts: &LogOptions) -> Result<LogStream, FetchFailure> {
        let options = LogsOptions::<String> {
            follow: false,
            stdout: opts.show_stdout,
            stderr: opts.show_stderr,
            timestamps: opts.timestamps,
            tail: opts.tail.clone(),
            ..Default::default()
        };
        let owned_id = id.to_string();
        let stream = self
            .client
            .logs(id, Some(options))
            .map(move |item| match item {
                Ok(output) => Ok(reframe(output)),
                Err(e) => Err(FetchFailure::new(owned_id.clone(), e)),
            });
        Ok(stream.boxed())
    }
}
