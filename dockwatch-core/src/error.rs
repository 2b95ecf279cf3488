use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::ContainerId;

/// A stat or log fetch for a single container failed.
///
/// Recovered locally by the aggregator: the container's sample degrades to
/// zero and its logs degrade to a placeholder line.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("fetch failed for {id}: {reason}")]
pub struct FetchFailure {
    pub id: ContainerId,
    pub reason: String,
}

impl FetchFailure {
    pub fn new(id: impl Into<ContainerId>, reason: impl ToString) -> Self {
        Self {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

/// The runtime could not list containers, so no snapshot can be built.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("container list unavailable: {reason}")]
pub struct ListUnavailable {
    pub reason: String,
}

impl ListUnavailable {
    pub fn new(reason: impl ToString) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

/// A frame header that can never be satisfied by more input.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("unknown stream tag {tag}")]
    UnknownStream { tag: u8 },
    #[error("frame payload of {len} bytes exceeds limit")]
    Oversized { len: usize },
}

/// Why a refresh cycle published nothing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error(transparent)]
    List(#[from] ListUnavailable),
    #[error("refresh timed out after {}ms", after.as_millis())]
    TimedOut { after: Duration },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
