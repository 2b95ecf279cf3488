//! Dashboard State Controller.
//!
//! Turns successive snapshots into what the terminal draws: table rows, a
//! resource summary and colored log lines. Owns the state that must survive
//! refreshes (service colors, scroll position) and is only touched from the
//! rendering side.

use std::time::SystemTime;

use crate::feed::{FeedState, Staleness};
use crate::model::{ContainerRecord, HostInfo, Snapshot, StreamKind};
use crate::state::{ColorRegistry, ScrollMode, ScrollState};

const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = MB * 1024.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceRow {
    pub service: String,
    pub state: String,
    pub running: bool,
    pub image: String,
    pub cpu: String,
    pub memory: String,
    pub logs: String,
    pub color: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSummary {
    pub cpu_count: usize,
    pub mem_total: String,
    pub mem_free: String,
    pub updated: String,
}

impl ResourceSummary {
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CPU Cores", self.cpu_count.to_string()),
            ("Memory Total", self.mem_total.clone()),
            ("Memory Free", self.mem_free.clone()),
            ("Updated", self.updated.clone()),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColoredLine {
    pub color: Option<usize>,
    pub service: String,
    pub stream: StreamKind,
    pub text: String,
    pub placeholder: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView {
    pub rows: Vec<ServiceRow>,
    pub resources: Option<ResourceSummary>,
    pub logs: Vec<ColoredLine>,
    /// Index of the first log line to draw.
    pub scroll: usize,
    pub mode: ScrollMode,
    /// Human readable stale marker, set while refreshes are failing.
    pub stale: Option<String>,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    colors: ColorRegistry,
    scroll: ScrollState,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new snapshot's services and log length.
    pub fn apply(&mut self, snapshot: &Snapshot) {
        for c in &snapshot.containers {
            self.colors.assign(&c.service);
        }
        for entry in &snapshot.flat_logs {
            self.colors.assign(&entry.service);
        }
        self.scroll.on_content(snapshot.flat_logs.len());
    }

    pub fn color_of(&self, service: &str) -> Option<usize> {
        self.colors.get(service)
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollState {
        &mut self.scroll
    }

    pub fn render(&self, feed: &FeedState) -> DashboardView {
        let stale = feed.stale.as_ref().map(stale_label);
        let Some(snapshot) = feed.snapshot.as_deref() else {
            return DashboardView {
                rows: Vec::new(),
                resources: None,
                logs: Vec::new(),
                scroll: 0,
                mode: self.scroll.mode(),
                stale,
            };
        };

        DashboardView {
            rows: snapshot.containers.iter().map(|c| self.row(c)).collect(),
            resources: Some(resources(&snapshot.host, snapshot.taken_at)),
            logs: snapshot
                .flat_logs
                .iter()
                .map(|e| ColoredLine {
                    color: self.colors.get(&e.service),
                    service: e.service.clone(),
                    stream: e.stream,
                    text: e.line.clone(),
                    placeholder: e.placeholder,
                })
                .collect(),
            scroll: self.scroll.visible_offset(),
            mode: self.scroll.mode(),
            stale,
        }
    }

    fn row(&self, c: &ContainerRecord) -> ServiceRow {
        let (cpu, memory) = if c.stat.measured {
            (
                format!("{:.2}", c.stat.cpu_percent),
                format_mb(c.stat.mem_usage_bytes),
            )
        } else {
            ("-".to_string(), "-".to_string())
        };
        ServiceRow {
            service: c.service.clone(),
            state: c.state.clone(),
            running: c.is_running(),
            image: c.image.clone(),
            cpu,
            memory,
            logs: format!("{} lines", c.logs.line_count()),
            color: self.colors.get(&c.service),
        }
    }
}

fn resources(host: &HostInfo, taken_at: SystemTime) -> ResourceSummary {
    ResourceSummary {
        cpu_count: host.cpu_count,
        mem_total: format!("{:.2} GB", host.mem_total as f64 / GB),
        mem_free: format_mb(host.mem_free),
        updated: format!("{} UTC", format_clock(taken_at)),
    }
}

fn stale_label(stale: &Staleness) -> String {
    format!(
        "stale since {} UTC: {}",
        format_clock(stale.since),
        stale.reason
    )
}

pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MB)
}

/// Formats a SystemTime as HH:MM:SS (UTC)
pub fn format_clock(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            let hours = (secs / 3600) % 24;
            let minutes = (secs / 60) % 60;
            let seconds = secs % 60;
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        }
        Err(_) => "??:??:??".to_string(),
    }
}
