pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod probe;
pub mod stats;
pub mod store;
pub mod summary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub use config::Config;
pub use error::{Error, Result};

/// A service that is being watched, as stored in the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub endpoint: Option<String>,
    pub container: Option<String>,
    /// `None` when the stored check type is not one we recognize.
    pub mode: Option<CheckMode>,
    pub icon: Option<String>,
    pub enabled: bool,
}

/// Which probes apply to a `Service` and how their results combine.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    #[serde(alias = "http")]
    Network,
    #[serde(alias = "docker")]
    Process,
    Both,
}

impl CheckMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Process => "process",
            Self::Both => "both",
        }
    }
}

impl Display for CheckMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "network" | "http" => Ok(Self::Network),
            "process" | "docker" => Ok(Self::Process),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown check mode `{other}`")),
        }
    }
}

/// The status of a `Service`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
    Degraded,
    #[default]
    Unknown,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Degraded => "degraded",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "degraded" => Ok(Self::Degraded),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown status `{other}`")),
        }
    }
}

/// One evaluation of a service. The timestamp is assigned when it is
/// persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    pub status: Status,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl Verdict {
    #[must_use]
    pub fn up(latency_ms: u64) -> Self {
        Self {
            status: Status::Up,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    #[must_use]
    pub fn down(latency_ms: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            status: Status::Down,
            latency_ms,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a process liveness probe. Never carries a latency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProcessCheck {
    pub status: Status,
    pub error: Option<String>,
}

impl ProcessCheck {
    #[must_use]
    pub fn up() -> Self {
        Self {
            status: Status::Up,
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(status: Status, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
        }
    }
}

impl From<ProcessCheck> for Verdict {
    fn from(check: ProcessCheck) -> Self {
        Self {
            status: check.status,
            latency_ms: None,
            error: check.error,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimedStatus {
    pub time: DateTime<Utc>,
    pub status: Status,
}
