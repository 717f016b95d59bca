//! Live status plus recent history for every enabled service.

use crate::catalog::Catalog;
use crate::evaluator::evaluate;
use crate::probe::Prober;
use crate::store::Store;
use crate::{Result, Service, Status, Verdict};
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// What the presentation layer gets for one service.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub url: Option<String>,
    pub public_url: Option<String>,
    pub icon_emoji: Option<String>,
    pub status: Status,
    pub response_time_ms: Option<u64>,
    pub error_message: Option<String>,
    /// `true` for each `up` record in the window, oldest first.
    pub sparkline: Vec<bool>,
}

pub struct Dashboard {
    store: Store,
    prober: Arc<dyn Prober>,
    catalog: Arc<Catalog>,
    window: Duration,
    max_concurrent_probes: usize,
}

impl Dashboard {
    #[must_use]
    pub fn new(
        store: Store,
        prober: Arc<dyn Prober>,
        catalog: Arc<Catalog>,
        window: Duration,
        max_concurrent_probes: usize,
    ) -> Self {
        Self {
            store,
            prober,
            catalog,
            window,
            max_concurrent_probes: max_concurrent_probes.max(1),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Probes every enabled service, records the results and returns one
    /// summary per service in registration order.
    pub async fn get_health_summary(&self) -> Result<Vec<ServiceSummary>> {
        let services = self.store.list_enabled().await?;
        self.summarize(&services, self.window).await
    }

    /// Summarizes `services` over the trailing `window`.
    ///
    /// History is read before the fresh verdicts are written, so sparklines
    /// end with the previous check. Probes run concurrently, bounded by the
    /// configured limit. A storage failure aborts the whole summary.
    pub async fn summarize(
        &self,
        services: &[Service],
        window: Duration,
    ) -> Result<Vec<ServiceSummary>> {
        let since = window_start(Utc::now(), window);
        let ids = services.iter().map(|s| s.id).collect();
        let mut history = self.store.window_all(ids, since).await?;

        let verdicts: Vec<Verdict> = stream::iter(services.to_vec())
            .map(|service| {
                let prober = Arc::clone(&self.prober);
                async move { evaluate(prober.as_ref(), &service).await }
            })
            .buffered(self.max_concurrent_probes)
            .collect()
            .await;

        let mut summaries = Vec::with_capacity(services.len());
        for (service, verdict) in services.iter().zip(verdicts) {
            self.store.append(service.id, &verdict).await?;

            let sparkline = history
                .remove(&service.id)
                .unwrap_or_default()
                .iter()
                .map(|record| record.status == Status::Up)
                .collect();

            summaries.push(ServiceSummary {
                id: service.id,
                name: service.name.clone(),
                display_name: service.display_name.clone(),
                url: service.endpoint.clone(),
                public_url: self.catalog.public_endpoint(&service.name).map(str::to_string),
                icon_emoji: service.icon.clone(),
                status: verdict.status,
                response_time_ms: verdict.latency_ms,
                error_message: verdict.error,
                sparkline,
            });
        }
        Ok(summaries)
    }

    /// Refreshes the summary every `interval` in the background, so history
    /// keeps accumulating without anyone viewing the dashboard.
    pub fn spawn_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.get_health_summary().await {
                    Ok(summaries) => {
                        let up = summaries.iter().filter(|s| s.status == Status::Up).count();
                        info!(up, total = summaries.len(), "polled services");
                    }
                    Err(e) => warn!(error = %e, "polling services failed"),
                }
            }
        })
    }
}

/// Start of a trailing `window` ending at `now`. A window reaching past
/// the earliest representable time covers all history.
fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
