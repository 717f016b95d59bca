//! Machine statistics for the dashboard header: containers, drives, CPU, RAM.
//!
//! Every section reports its own error; nothing here fails the whole call.

use crate::probe::{ContainerRuntime, BACKEND_UNAVAILABLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::{Disks, System};
use tracing::warn;

/// File in the data directory holding stats of drives this host cannot see.
pub const EXTERNAL_STATS_FILE: &str = "nas_stats.json";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SystemStats {
    pub docker: ContainerCounts,
    pub drives: BTreeMap<String, DriveStats>,
    pub cpu: CpuStats,
    pub ram: RamStats,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerCounts {
    pub running: usize,
    pub total: usize,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DriveStats {
    #[serde(default)]
    pub total_gb: f64,
    #[serde(default)]
    pub used_gb: f64,
    #[serde(default)]
    pub free_gb: f64,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub error: Option<String>,
}

impl DriveStats {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    fn from_bytes(total: u64, free: u64) -> Self {
        let used = total.saturating_sub(free);
        Self {
            total_gb: gigabytes(total),
            used_gb: gigabytes(used),
            free_gb: gigabytes(free),
            percent: percent(used as f64, total as f64),
            error: None,
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct CpuStats {
    pub percent: f64,
    pub error: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct RamStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
    pub error: Option<String>,
}

pub struct StatsCollector {
    runtime: Option<Arc<dyn ContainerRuntime>>,
    data_dir: PathBuf,
    disk_mounts: Vec<PathBuf>,
    external_drives: Vec<String>,
}

impl StatsCollector {
    #[must_use]
    pub fn new(
        runtime: Option<Arc<dyn ContainerRuntime>>,
        data_dir: PathBuf,
        disk_mounts: Vec<PathBuf>,
        external_drives: Vec<String>,
    ) -> Self {
        Self {
            runtime,
            data_dir,
            disk_mounts,
            external_drives,
        }
    }

    pub async fn get_system_stats(&self) -> SystemStats {
        let docker = self.container_counts().await;

        let mounts = self.disk_mounts.clone();
        let host = tokio::task::spawn_blocking(move || host_stats(&mounts)).await;
        let (mut drives, cpu, ram) = match host {
            Ok(host) => host,
            Err(e) => {
                warn!(error = %e, "collecting host stats failed");
                let error = e.to_string();
                (
                    BTreeMap::new(),
                    CpuStats {
                        error: Some(error.clone()),
                        ..CpuStats::default()
                    },
                    RamStats {
                        error: Some(error),
                        ..RamStats::default()
                    },
                )
            }
        };

        drives.extend(external_drives(
            &self.data_dir.join(EXTERNAL_STATS_FILE),
            &self.external_drives,
        ));

        SystemStats {
            docker,
            drives,
            cpu,
            ram,
        }
    }

    async fn container_counts(&self) -> ContainerCounts {
        let Some(runtime) = &self.runtime else {
            return ContainerCounts {
                error: Some(BACKEND_UNAVAILABLE.to_string()),
                ..ContainerCounts::default()
            };
        };
        match runtime.list_states().await {
            Ok(states) => ContainerCounts {
                running: states.iter().filter(|s| *s == "running").count(),
                total: states.len(),
                error: None,
            },
            Err(e) => ContainerCounts {
                error: Some(e.to_string()),
                ..ContainerCounts::default()
            },
        }
    }
}

fn host_stats(mounts: &[PathBuf]) -> (BTreeMap<String, DriveStats>, CpuStats, RamStats) {
    let disks = Disks::new_with_refreshed_list();
    let drives = mounts
        .iter()
        .map(|mount| {
            let stats = disks
                .list()
                .iter()
                .find(|d| d.mount_point() == mount.as_path())
                .map_or_else(
                    || DriveStats::failed(format!("{} is not mounted", mount.display())),
                    |d| DriveStats::from_bytes(d.total_space(), d.available_space()),
                );
            (mount.display().to_string(), stats)
        })
        .collect();

    let mut sys = System::new();
    sys.refresh_cpu();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();
    sys.refresh_memory();

    let cpu = if sys.cpus().is_empty() {
        CpuStats {
            error: Some("CPU monitoring unavailable".to_string()),
            ..CpuStats::default()
        }
    } else {
        CpuStats {
            percent: round1(f64::from(sys.global_cpu_info().cpu_usage())),
            error: None,
        }
    };

    let total = sys.total_memory();
    let ram = if total == 0 {
        RamStats {
            error: Some("RAM monitoring unavailable".to_string()),
            ..RamStats::default()
        }
    } else {
        let used = total.saturating_sub(sys.available_memory());
        RamStats {
            total_gb: gigabytes(total),
            used_gb: gigabytes(used),
            percent: percent(used as f64, total as f64),
            error: None,
        }
    };

    (drives, cpu, ram)
}

/// Reads drives reported by another host. A missing file means the external
/// collector has not run yet.
fn external_drives(path: &Path, names: &[String]) -> BTreeMap<String, DriveStats> {
    if names.is_empty() {
        return BTreeMap::new();
    }

    let report: Result<BTreeMap<String, DriveStats>, String> = match std::fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).map_err(|e| e.to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err("stats not yet collected".to_string())
        }
        Err(e) => Err(e.to_string()),
    };

    names
        .iter()
        .map(|name| {
            let stats = match &report {
                Ok(report) => report
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| DriveStats::failed("no stats reported")),
                Err(e) => DriveStats::failed(e.clone()),
            };
            (name.clone(), stats)
        })
        .collect()
}

fn gigabytes(bytes: u64) -> f64 {
    round1(bytes as f64 / GIB)
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        round1(part / whole * 100.0)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
