use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use dockwatch_core::error::{FetchFailure, ListUnavailable};
use dockwatch_core::frame::encode_frame;
use dockwatch_core::metrics::StatCounters;
use dockwatch_core::model::{ContainerSummary, PROJECT_LABEL, SERVICE_LABEL, StreamKind};
use dockwatch_core::runtime::{LogOptions, LogStream, RuntimeClient};

const DEMO_CORES: u32 = 4;
const SYSTEM_TICK: u64 = 1_000_000_000;

struct DemoContainer {
    id: &'static str,
    service: Option<&'static str>,
    image: &'static str,
    command: &'static str,
    base_cpu: f64,
    base_mem: u64,
}

static CONTAINERS: [DemoContainer; 5] = [
    DemoContainer {
        id: "3f9a1c2b7d4e8f60a1b2c3d4e5f60718293a4b5c6d7e8f90",
        service: Some("api"),
        image: "demo/api:1.4.2",
        command: "node server.js",
        base_cpu: 12.0,
        base_mem: 150_000_000,
    },
    DemoContainer {
        id: "8c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d",
        service: Some("worker"),
        image: "demo/worker:1.4.2",
        command: "python -m worker",
        base_cpu: 35.0,
        base_mem: 280_000_000,
    },
    DemoContainer {
        id: "1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f",
        service: Some("postgres"),
        image: "postgres:16",
        command: "docker-entrypoint.sh postgres",
        base_cpu: 8.0,
        base_mem: 512_000_000,
    },
    DemoContainer {
        id: "f0e1d2c3b4a5968778695a4b3c2d1e0f1a2b3c4d5e6f7a8b",
        service: Some("redis"),
        image: "redis:7-alpine",
        command: "redis-server",
        base_cpu: 3.0,
        base_mem: 64_000_000,
    },
    DemoContainer {
        id: "5d4c3b2a1f0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e",
        service: None,
        image: "busybox:latest",
        command: "sleep infinity",
        base_cpu: 0.0,
        base_mem: 1_000_000,
    },
];

/// Synthetic runtime for demos and machines without Docker.
///
/// Every list call advances a tick; counters and log text are derived from it
/// so consecutive refreshes look alive.
pub struct DemoRuntime {
    tick: AtomicU64,
}

impl DemoRuntime {
    pub fn new() -> Self {
        Self {
            tick: AtomicU64::new(0),
        }
    }

    fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }

    fn find(&self, id: &str) -> Result<&'static DemoContainer, FetchFailure> {
        CONTAINERS
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| FetchFailure::new(id, "no such container"))
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn log_line(c: &DemoContainer, tick: u64) -> Option<(StreamKind, String)> {
    let text = match c.service {
        Some("api") => {
            if tick % 12 == 7 {
                return Some((
                    StreamKind::Stderr,
                    "[ERROR] Connection refused to upstream service".into(),
                ));
            } else if tick % 8 == 3 {
                "[WARN] High latency detected: 450ms".into()
            } else {
                let routes = [
                    "GET /health 200",
                    "GET /api/users 200",
                    "POST /api/data 201",
                    "GET /api/status 200",
                ];
                routes[(tick as usize) % routes.len()].into()
            }
        }
        Some("worker") => {
            if tick % 10 == 5 {
                return Some((
                    StreamKind::Stderr,
                    format!("[ERROR] Job {} failed: timeout after 30s", tick),
                ));
            } else if tick % 7 == 2 {
                format!("[WARN] Queue depth high: {} pending", 50 + (tick % 30))
            } else {
                format!("processed job id={}", tick)
            }
        }
        Some("postgres") => {
            if tick % 15 == 10 {
                "[WARN] Slow query detected: 1250ms".into()
            } else {
                let msgs = [
                    "checkpoint complete",
                    "autovacuum: processing",
                    "connection accepted",
                ];
                msgs[(tick as usize) % msgs.len()].into()
            }
        }
        Some("redis") => {
            let keys = 1000 + (tick % 500);
            let mem = 2.0 + (tick % 10) as f32 * 0.1;
            format!("keys: {}, memory: {:.1}MB", keys, mem)
        }
        // The unlabeled container never logs.
        _ => return None,
    };
    Some((StreamKind::Stdout, text))
}

fn tail_len(tail: &str, available: u64) -> u64 {
    match tail.parse::<u64>() {
        Ok(n) => n.min(available),
        Err(_) => available,
    }
}

#[async_trait]
impl RuntimeClient for DemoRuntime {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, ListUnavailable> {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CONTAINERS
            .iter()
            .map(|c| {
                let mut labels = HashMap::new();
                if let Some(service) = c.service {
                    labels.insert(SERVICE_LABEL.to_string(), service.to_string());
                    labels.insert(PROJECT_LABEL.to_string(), "demo".to_string());
                }
                ContainerSummary {
                    id: c.id.to_string(),
                    names: vec![format!("/demo-{}-1", c.service.unwrap_or("sidecar"))],
                    image: c.image.to_string(),
                    status: format!("Up {} seconds", tick * 3),
                    state: "running".to_string(),
                    command: c.command.to_string(),
                    labels,
                    created_at: 1_700_000_000,
                }
            })
            .collect())
    }

    async fn fetch_stat_counters(&self, id: &str) -> Result<StatCounters, FetchFailure> {
        let c = self.find(id)?;
        let tick = self.current_tick();

        let cpu_pct = (c.base_cpu + (tick % 10) as f64 * 1.5 - 5.0).max(0.0);
        // Share of all cores over one system tick that yields `cpu_pct`.
        let cpu_delta = (cpu_pct / 100.0 / DEMO_CORES as f64 * SYSTEM_TICK as f64) as u64;
        let prev_total = tick * SYSTEM_TICK / 10;

        Ok(StatCounters {
            cur_total_usage: prev_total + cpu_delta,
            prev_total_usage: prev_total,
            cur_system_usage: (tick + 1) * SYSTEM_TICK,
            prev_system_usage: tick * SYSTEM_TICK,
            core_count: DEMO_CORES,
            mem_usage: c.base_mem + (tick % 20) * 1_000_000,
        })
    }

    async fn fetch_log_stream(&self, id: &str, opts: &LogOptions) -> Result<LogStream, FetchFailure> {
        let c = self.find(id)?;
        let tick = self.current_tick();

        let mut raw = Vec::new();
        let first = tick.saturating_sub(tail_len(&opts.tail, tick)) + 1;
        for t in first..=tick {
            let Some((kind, text)) = log_line(c, t) else {
                continue;
            };
            let wanted = match kind {
                StreamKind::Stdout => opts.show_stdout,
                StreamKind::Stderr => opts.show_stderr,
            };
            if !wanted {
                continue;
            }
            let line = if opts.timestamps {
                format!("2024-01-01T00:{:02}:{:02}Z {}\n", (t / 60) % 60, t % 60, text)
            } else {
                format!("{}\n", text)
            };
            raw.extend_from_slice(&encode_frame(kind, line.as_bytes()));
        }

        // Split into uneven reads the way a socket would.
        let mut chunks: Vec<Result<Bytes, FetchFailure>> = Vec::new();
        let mut rest = Bytes::from(raw);
        let mut size = 5;
        while !rest.is_empty() {
            let n = size.min(rest.len());
            chunks.push(Ok(rest.split_to(n)));
            size = size * 3 % 61 + 1;
        }
        Ok(Box::pin(stream::iter(chunks)))
    }
}
