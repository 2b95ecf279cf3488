use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_WORKERS;
use crate::error::ConfigError;
use crate::runtime::LogOptions;

/// File names looked up in the working directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "dockwatch.yml",
    "dockwatch.yaml",
    ".dockwatch.yml",
    ".dockwatch.yaml",
];

fn default_interval_ms() -> u64 {
    3000
}
fn default_deadline_ms() -> u64 {
    2500
}
fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Refresh settings, read from `dockwatch.yml` when present.
///
/// ```yaml
/// interval_ms: 3000
/// deadline_ms: 2500
/// workers: 8
/// logs:
///   tail: "100"
///   timestamps: false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Time between refresh cycles
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Deadline for one cycle; must be shorter than the interval
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Maximum concurrent per-container fetches
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub logs: LogOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            deadline_ms: default_deadline_ms(),
            workers: default_workers(),
            logs: LogOptions::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse settings from a YAML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Finds the first config file in `dir`, if any.
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: "must be at least 1".into(),
            });
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.deadline_ms == 0 || self.deadline_ms >= self.interval_ms {
            return Err(ConfigError::Invalid {
                field: "deadline_ms",
                reason: format!(
                    "must be between 1 and interval_ms ({}) exclusive, got {}",
                    self.interval_ms, self.deadline_ms
                ),
            });
        }
        if self.logs.tail.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logs.tail",
                reason: "must be a line count or \"all\"".into(),
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Changes the interval, pulling the deadline under it if needed.
    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
        if self.deadline_ms >= interval_ms {
            self.deadline_ms = interval_ms * 5 / 6;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.deadline() < settings.interval());
        assert_eq!(settings.logs.tail, "50");
        assert!(settings.logs.timestamps);
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
interval_ms: 5000
logs:
  tail: "200"
"#;
        let settings = Settings::from_str(yaml).unwrap();
        assert_eq!(settings.interval_ms, 5000);
        assert_eq!(settings.deadline_ms, 2500);
        assert_eq!(settings.workers, DEFAULT_WORKERS);
        assert_eq!(settings.logs.tail, "200");
        assert!(settings.logs.show_stderr);
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let settings = Settings::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_deadline_must_be_shorter_than_interval() {
        let yaml = r#"
interval_ms: 1000
deadline_ms: 1000
"#;
        let result = Settings::from_str(yaml);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "deadline_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Settings::from_str("workers: 0");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "workers", .. })
        ));
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            Settings::from_str("interval_ms: [fast]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_set_interval_keeps_deadline_below() {
        let mut settings = Settings::default();
        settings.set_interval_ms(1200);
        assert_eq!(settings.deadline_ms, 1000);
        assert!(settings.validate().is_ok());

        settings.set_interval_ms(10_000);
        assert_eq!(settings.deadline_ms, 1000);
    }

    #[test]
    fn test_find_in_missing_dir() {
        assert_eq!(Settings::find_in(Path::new("/nonexistent/dockwatch")), None);
    }

    #[test]
    fn test_load_reports_path_on_io_error() {
        let err = Settings::load(Path::new("/nonexistent/dockwatch.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dockwatch.yml"));
    }
}
