mod api_util;

use aernhome::catalog::Catalog;
use aernhome::probe::{ContainerRuntime, DockerCli, Probes};
use aernhome::stats::{StatsCollector, SystemStats};
use aernhome::store::Store;
use aernhome::summary::{Dashboard, ServiceSummary};
use aernhome::Config;
use api_util::ApiError;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
    stats: Arc<StatsCollector>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let address = cli.address.clone();
    let config = cli.into_config();

    let catalog = match &config.catalog_file {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::bundled(),
    };

    let store = Store::open(&config.database_path(), config.retention)?;
    store.seed(catalog.entries()).await?;

    let runtime = DockerCli::detect(config.docker_program.clone(), config.probe_timeout)
        .await
        .map(|docker| Arc::new(docker) as Arc<dyn ContainerRuntime>);
    let probes = Probes::new(config.probe_timeout, runtime.clone())?;

    let dashboard = Arc::new(Dashboard::new(
        store,
        Arc::new(probes),
        Arc::new(catalog),
        config.history_window,
        config.max_concurrent_probes,
    ));
    let stats = Arc::new(StatsCollector::new(
        runtime,
        config.data_dir.clone(),
        config.disk_mounts.clone(),
        config.external_drives.clone(),
    ));

    if let Some(interval) = config.poll_interval {
        info!(?interval, "polling services in the background");
        dashboard.clone().spawn_poller(interval);
    }

    let app = router(AppState { dashboard, stats });

    info!("Binding to {}", address);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Starting API server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("API server stopped");
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/health", get(get_health))
        .route("/api/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn get_health(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<ServiceSummary>>), ApiError> {
    let summaries = state.dashboard.get_health_summary().await?;
    Ok((StatusCode::OK, Json(summaries)))
}

async fn get_stats(State(state): State<AppState>) -> (StatusCode, Json<SystemStats>) {
    (StatusCode::OK, Json(state.stats.get_system_stats().await))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown requested");
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Listening address for the JSON API
    #[arg(short, long, env = "DASHBOARD_ADDRESS", default_value = "0.0.0.0:5000")]
    address: String,

    /// Directory holding the database and external drive stats
    #[arg(short, long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// JSON catalog replacing the bundled service list
    #[arg(short, long, env = "CATALOG_FILE")]
    catalog: Option<PathBuf>,

    /// Ceiling for a single probe, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 5)]
    http_timeout_secs: u64,

    /// Trailing window covered by sparklines, in hours
    #[arg(long, env = "WINDOW_HOURS", default_value_t = 24)]
    window_hours: u64,

    /// Age after which history records are deleted, in days
    #[arg(long, env = "RETENTION_DAYS", default_value_t = 7)]
    retention_days: u64,

    /// Maximum number of services probed at once
    #[arg(long, env = "MAX_CONCURRENT_PROBES", default_value_t = 8)]
    max_concurrent_probes: usize,

    /// Docker command line client used for container checks
    #[arg(long, env = "DOCKER_PROGRAM", default_value = "docker")]
    docker: String,

    /// Mount points reported as local drives
    #[arg(long = "disk", env = "DISKS", value_delimiter = ',', default_value = "/")]
    disks: Vec<PathBuf>,

    /// Drive names read from nas_stats.json in the data directory
    #[arg(long = "external-drive", env = "EXTERNAL_DRIVES", value_delimiter = ',')]
    external_drives: Vec<String>,

    /// Probe services in the background every N seconds (0 disables)
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 0)]
    poll_interval_secs: u64,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            data_dir: self.data_dir,
            catalog_file: self.catalog,
            probe_timeout: Duration::from_secs(self.http_timeout_secs),
            history_window: Duration::from_secs(self.window_hours * 60 * 60),
            retention: Duration::from_secs(self.retention_days * 24 * 60 * 60),
            max_concurrent_probes: self.max_concurrent_probes,
            docker_program: self.docker,
            disk_mounts: self.disks,
            external_drives: self.external_drives,
            poll_interval: (self.poll_interval_secs > 0)
                .then(|| Duration::from_secs(self.poll_interval_secs)),
        }
    }
}
