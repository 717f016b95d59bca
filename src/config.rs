use std::path::PathBuf;
use std::time::Duration;

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "dashboard.db";

/// Runtime settings shared by the core and its peripheral boundary.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub catalog_file: Option<PathBuf>,
    /// Ceiling for a single network or process probe.
    pub probe_timeout: Duration,
    /// Trailing window the sparkline covers.
    pub history_window: Duration,
    /// Records older than this are pruned on every write.
    pub retention: Duration,
    pub max_concurrent_probes: usize,
    pub docker_program: String,
    pub disk_mounts: Vec<PathBuf>,
    pub external_drives: Vec<String>,
    pub poll_interval: Option<Duration>,
}

impl Config {
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            catalog_file: None,
            probe_timeout: Duration::from_secs(5),
            history_window: Duration::from_secs(24 * 60 * 60),
            retention: Duration::from_secs(7 * 24 * 60 * 60),
            max_concurrent_probes: 8,
            docker_program: "docker".to_string(),
            disk_mounts: vec![PathBuf::from("/")],
            external_drives: Vec::new(),
            poll_interval: None,
        }
    }
}
