use std::collections::HashMap;
use std::time::SystemTime;

pub type ContainerId = String;
pub type ServiceName = String;

/// Label set by Compose naming the service a container belongs to.
pub const SERVICE_LABEL: &str = "com.docker.compose.service";
pub const DEPENDS_ON_LABEL: &str = "com.docker.compose.depends_on";
pub const PROJECT_LABEL: &str = "com.docker.compose.project";
pub const WORKING_DIR_LABEL: &str = "com.docker.compose.project.working_dir";
pub const CONFIG_FILES_LABEL: &str = "com.docker.compose.project.config_files";
pub const IMAGE_REF_LABEL: &str = "org.opencontainers.image.ref.name";
pub const IMAGE_VERSION_LABEL: &str = "org.opencontainers.image.version";

/// Length of the short container id used when no service label exists.
pub const SHORT_ID_LEN: usize = 12;

pub const NO_LOGS_TEXT: &str = "No logs available";
pub const LOGS_UNAVAILABLE_TEXT: &str = "Error fetching logs";

/// Which output stream a log line came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub stream: StreamKind,
    /// Trimmed, never empty.
    pub text: String,
}

impl LogLine {
    /// Builds a line from raw payload text, returning `None` when nothing
    /// remains after trimming.
    pub fn from_payload(stream: StreamKind, payload: &str) -> Option<Self> {
        let text = payload.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            stream,
            text: text.to_string(),
        })
    }
}

/// Decoded logs for one container.
///
/// The placeholder variants render as a single sentinel line but are never
/// counted as log content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerLogs {
    Lines(Vec<LogLine>),
    NoLogs,
    Unavailable,
}

impl ContainerLogs {
    pub fn from_lines(lines: Vec<LogLine>) -> Self {
        if lines.is_empty() {
            Self::NoLogs
        } else {
            Self::Lines(lines)
        }
    }

    /// Number of genuine log lines (placeholders count as zero).
    pub fn line_count(&self) -> usize {
        match self {
            Self::Lines(lines) => lines.len(),
            Self::NoLogs | Self::Unavailable => 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Self::Lines(_))
    }

    pub fn placeholder_text(&self) -> Option<&'static str> {
        match self {
            Self::Lines(_) => None,
            Self::NoLogs => Some(NO_LOGS_TEXT),
            Self::Unavailable => Some(LOGS_UNAVAILABLE_TEXT),
        }
    }

    /// Lines as shown to the user, sentinel included.
    pub fn display_lines(&self) -> Vec<&str> {
        match self {
            Self::Lines(lines) => lines.iter().map(|l| l.text.as_str()).collect(),
            other => other.placeholder_text().into_iter().collect(),
        }
    }
}

/// CPU and memory figures for one container in one refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatSample {
    pub cpu_percent: f64,
    pub mem_usage_bytes: u64,
    /// False when the stat fetch failed and the zeros are a stand-in.
    pub measured: bool,
}

impl StatSample {
    pub fn new(cpu_percent: f64, mem_usage_bytes: u64) -> Self {
        Self {
            cpu_percent,
            mem_usage_bytes,
            measured: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            cpu_percent: 0.0,
            mem_usage_bytes: 0,
            measured: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub cpu_count: usize,
    pub mem_total: u64,
    pub mem_free: u64,
}

/// Container metadata as returned by the runtime's list call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub names: Vec<String>,
    pub image: String,
    pub status: String,
    pub state: String,
    pub command: String,
    pub labels: HashMap<String, String>,
    pub created_at: i64,
}

impl ContainerSummary {
    pub fn service_name(&self) -> ServiceName {
        service_name(self.labels.get(SERVICE_LABEL).map(String::as_str), &self.id)
    }

    fn label(&self, key: &str) -> Option<String> {
        self.labels
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    /// OCI ref name and version joined by a space, when either is set.
    fn image_version(&self) -> Option<String> {
        let parts: Vec<String> = [IMAGE_REF_LABEL, IMAGE_VERSION_LABEL]
            .into_iter()
            .filter_map(|key| self.label(key))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Resolves the display name for a container: the service label when set,
/// otherwise the short id.
pub fn service_name(label: Option<&str>, id: &str) -> ServiceName {
    match label {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => id.chars().take(SHORT_ID_LEN).collect(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: Option<String>,
    pub image: String,
    pub status: String,
    pub state: String,
    pub command: String,
    pub service: ServiceName,
    pub project: Option<String>,
    pub depends_on: Option<String>,
    pub working_dir: Option<String>,
    pub config_files: Option<String>,
    pub image_version: Option<String>,
    pub created_at: i64,
    pub stat: StatSample,
    pub logs: ContainerLogs,
}

impl ContainerRecord {
    pub fn new(summary: ContainerSummary, stat: StatSample, logs: ContainerLogs) -> Self {
        let service = summary.service_name();
        let project = summary.label(PROJECT_LABEL);
        let depends_on = summary.label(DEPENDS_ON_LABEL);
        let working_dir = summary.label(WORKING_DIR_LABEL);
        let config_files = summary.label(CONFIG_FILES_LABEL);
        let image_version = summary.image_version();
        let name = summary
            .names
            .first()
            .map(|n| n.trim_start_matches('/').to_string());
        Self {
            id: summary.id,
            name,
            image: summary.image,
            status: summary.status,
            state: summary.state,
            command: summary.command,
            service,
            project,
            depends_on,
            working_dir,
            config_files,
            image_version,
            created_at: summary.created_at,
            stat,
            logs,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// One line of the unified log view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatLogEntry {
    pub service: ServiceName,
    pub stream: StreamKind,
    pub line: String,
    pub placeholder: bool,
}

/// A fully assembled telemetry picture for one refresh cycle.
///
/// Never mutated after construction; shared behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub containers: Vec<ContainerRecord>,
    pub host: HostInfo,
    pub flat_logs: Vec<FlatLogEntry>,
    pub taken_at: SystemTime,
}

impl Snapshot {
    /// Builds a snapshot, flattening logs container by container in list order.
    pub fn new(containers: Vec<ContainerRecord>, host: HostInfo, taken_at: SystemTime) -> Self {
        let flat_logs = flatten_logs(&containers);
        Self {
            containers,
            host,
            flat_logs,
            taken_at,
        }
    }
}

fn flatten_logs(containers: &[ContainerRecord]) -> Vec<FlatLogEntry> {
    let mut out = Vec::new();
    for c in containers {
        match &c.logs {
            ContainerLogs::Lines(lines) => {
                out.extend(lines.iter().map(|l| FlatLogEntry {
                    service: c.service.clone(),
                    stream: l.stream,
                    line: l.text.clone(),
                    placeholder: false,
                }));
            }
            placeholder => {
                if let Some(text) = placeholder.placeholder_text() {
                    out.push(FlatLogEntry {
                        service: c.service.clone(),
                        stream: StreamKind::Stdout,
                        line: text.to_string(),
                        placeholder: true,
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, service: Option<&str>) -> ContainerSummary {
        let mut labels = HashMap::new();
        if let Some(s) = service {
            labels.insert(SERVICE_LABEL.to_string(), s.to_string());
        }
        ContainerSummary {
            id: id.to_string(),
            names: vec![format!("/{}-1", id)],
            image: "nginx:latest".into(),
            state: "running".into(),
            labels,
            ..Default::default()
        }
    }

    fn line(text: &str) -> LogLine {
        LogLine {
            stream: StreamKind::Stdout,
            text: text.into(),
        }
    }

    #[test]
    fn test_service_name_prefers_label() {
        assert_eq!(summary("abcdef0123456789", Some("web")).service_name(), "web");
    }

    #[test]
    fn test_service_name_falls_back_to_short_id() {
        assert_eq!(summary("abcdef0123456789", None).service_name(), "abcdef012345");
        assert_eq!(summary("abc123", None).service_name(), "abc123");
        assert_eq!(summary("abcdef012345", None).service_name(), "abcdef012345");
    }

    #[test]
    fn test_empty_service_label_is_ignored() {
        assert_eq!(summary("112233445566aa", Some("")).service_name(), "112233445566");
    }

    #[test]
    fn test_log_line_trims_and_drops_blank() {
        assert_eq!(
            LogLine::from_payload(StreamKind::Stderr, "  boom \r\n"),
            Some(LogLine {
                stream: StreamKind::Stderr,
                text: "boom".into()
            })
        );
        assert_eq!(LogLine::from_payload(StreamKind::Stdout, " \n\t"), None);
    }

    #[test]
    fn test_placeholder_is_not_counted() {
        let logs = ContainerLogs::from_lines(vec![]);
        assert_eq!(logs, ContainerLogs::NoLogs);
        assert_eq!(logs.line_count(), 0);
        assert_eq!(logs.display_lines(), vec![NO_LOGS_TEXT]);

        let real = ContainerLogs::from_lines(vec![line(NO_LOGS_TEXT)]);
        assert!(!real.is_placeholder());
        assert_eq!(real.line_count(), 1);
    }

    #[test]
    fn test_record_reads_compose_labels() {
        let mut s = summary("abcdef0123456789", Some("api"));
        s.labels.insert(DEPENDS_ON_LABEL.into(), "db:service_started:false".into());
        s.labels.insert(PROJECT_LABEL.into(), "shop".into());
        let rec = ContainerRecord::new(s, StatSample::new(1.0, 2), ContainerLogs::NoLogs);
        assert_eq!(rec.service, "api");
        assert_eq!(rec.project.as_deref(), Some("shop"));
        assert_eq!(rec.depends_on.as_deref(), Some("db:service_started:false"));
        assert_eq!(rec.name.as_deref(), Some("abcdef0123456789-1"));
        assert!(rec.is_running());
        assert_eq!(rec.working_dir, None);
        assert_eq!(rec.image_version, None);
    }

    #[test]
    fn test_record_reads_project_and_image_labels() {
        let mut s = summary("abcdef0123456789", Some("api"));
        s.labels.insert(WORKING_DIR_LABEL.into(), "/srv/shop".into());
        s.labels.insert(CONFIG_FILES_LABEL.into(), "/srv/shop/compose.yml".into());
        s.labels.insert(IMAGE_REF_LABEL.into(), "ubuntu".into());
        s.labels.insert(IMAGE_VERSION_LABEL.into(), "24.04".into());
        let rec = ContainerRecord::new(s, StatSample::new(0.0, 0), ContainerLogs::NoLogs);
        assert_eq!(rec.working_dir.as_deref(), Some("/srv/shop"));
        assert_eq!(rec.config_files.as_deref(), Some("/srv/shop/compose.yml"));
        assert_eq!(rec.image_version.as_deref(), Some("ubuntu 24.04"));

        let mut s = summary("abcdef0123456789", Some("api"));
        s.labels.insert(IMAGE_VERSION_LABEL.into(), "1.2.3".into());
        s.labels.insert(IMAGE_REF_LABEL.into(), String::new());
        let rec = ContainerRecord::new(s, StatSample::new(0.0, 0), ContainerLogs::NoLogs);
        assert_eq!(rec.image_version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_flat_logs_group_by_container_in_list_order() {
        let a = ContainerRecord::new(
            summary("aaaaaaaaaaaaaaaa", Some("a")),
            StatSample::new(0.0, 0),
            ContainerLogs::Lines(vec![line("a1"), line("a2")]),
        );
        let b = ContainerRecord::new(
            summary("bbbbbbbbbbbbbbbb", Some("b")),
            StatSample::unavailable(),
            ContainerLogs::Unavailable,
        );
        let c = ContainerRecord::new(
            summary("cccccccccccccccc", Some("c")),
            StatSample::new(0.0, 0),
            ContainerLogs::Lines(vec![line("c1")]),
        );
        let snap = Snapshot::new(vec![a, b, c], HostInfo::default(), SystemTime::UNIX_EPOCH);

        let got: Vec<(&str, &str, bool)> = snap
            .flat_logs
            .iter()
            .map(|e| (e.service.as_str(), e.line.as_str(), e.placeholder))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a", "a1", false),
                ("a", "a2", false),
                ("b", LOGS_UNAVAILABLE_TEXT, true),
                ("c", "c1", false),
            ]
        );
    }
}
