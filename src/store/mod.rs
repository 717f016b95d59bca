//! Durable service registry and health-check history, backed by SQLite.

mod actor;
mod history;
mod registry;
mod schema;

use crate::catalog::CatalogEntry;
use crate::{Error, Result, Service, TimedStatus, Verdict};
use actor::{StoreActor, StoreMessage};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Cloneable handle to the storage actor.
#[derive(Clone)]
pub struct Store {
    sender: mpsc::UnboundedSender<StoreMessage>,
}

impl Store {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path, retention: Duration) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| Error::DataDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened database");
        Self::start(conn, retention)
    }

    pub fn open_in_memory(retention: Duration) -> Result<Self> {
        Self::start(Connection::open_in_memory()?, retention)
    }

    fn start(conn: Connection, retention: Duration) -> Result<Self> {
        schema::initialize(&conn)?;
        let retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = StoreActor::new(receiver, conn, retention_ms);
        std::thread::spawn(move || actor.run());
        Ok(Self { sender })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> StoreMessage,
    ) -> Result<T> {
        let (send, recv) = oneshot::channel();
        self.sender.send(make(send)).map_err(|_| Error::StoreClosed)?;
        recv.await.map_err(|_| Error::StoreClosed)?
    }

    /// Registers every catalog entry whose name is not present yet. Rows
    /// that already exist are never overwritten. Returns how many were added.
    pub async fn seed(&self, entries: &[CatalogEntry]) -> Result<usize> {
        for entry in entries {
            entry.validate()?;
        }
        let entries = entries.to_vec();
        self.request(|respond_to| StoreMessage::Seed {
            entries,
            respond_to,
        })
        .await
    }

    /// Enabled services in registration order.
    pub async fn list_enabled(&self) -> Result<Vec<Service>> {
        self.request(|respond_to| StoreMessage::ListEnabled { respond_to })
            .await
    }

    /// Records `verdict` now and prunes expired history.
    pub async fn append(&self, service_id: i64, verdict: &Verdict) -> Result<()> {
        self.append_at(service_id, verdict, Utc::now()).await
    }

    /// Records `verdict` with an explicit timestamp. Pruning is relative to
    /// that timestamp.
    pub async fn append_at(
        &self,
        service_id: i64,
        verdict: &Verdict,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let verdict = verdict.clone();
        self.request(|respond_to| StoreMessage::Append {
            service_id,
            verdict,
            at_ms: at.timestamp_millis(),
            respond_to,
        })
        .await
    }

    /// History of one service at or after `since`, oldest first.
    pub async fn window(&self, service_id: i64, since: DateTime<Utc>) -> Result<Vec<TimedStatus>> {
        self.request(|respond_to| StoreMessage::Window {
            service_id,
            since_ms: since.timestamp_millis(),
            respond_to,
        })
        .await
    }

    /// History of several services in one query, grouped by service id.
    /// Services without records are absent from the map.
    pub async fn window_all(
        &self,
        service_ids: Vec<i64>,
        since: DateTime<Utc>,
    ) -> Result<HashMap<i64, Vec<TimedStatus>>> {
        self.request(|respond_to| StoreMessage::WindowAll {
            service_ids,
            since_ms: since.timestamp_millis(),
            respond_to,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::Status;

    const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[tokio::test]
    async fn reseeding_leaves_edited_rows_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.db");
        let catalog = Catalog::bundled();

        let store = Store::open(&path, RETENTION).unwrap();
        assert_eq!(store.seed(catalog.entries()).await.unwrap(), 9);

        let edit = Connection::open(&path).unwrap();
        edit.execute(
            "UPDATE services SET display_name = 'Renamed', url = 'http://10.0.0.9' WHERE name = 'n8n'",
            [],
        )
        .unwrap();

        assert_eq!(store.seed(catalog.entries()).await.unwrap(), 0);

        let services = store.list_enabled().await.unwrap();
        assert_eq!(services.len(), 9);
        let n8n = services.iter().find(|s| s.name == "n8n").unwrap();
        assert_eq!(n8n.display_name, "Renamed");
        assert_eq!(n8n.endpoint.as_deref(), Some("http://10.0.0.9"));
    }

    #[tokio::test]
    async fn database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dashboard.db");

        {
            let store = Store::open(&path, RETENTION).unwrap();
            store.seed(Catalog::bundled().entries()).await.unwrap();
            store.append(1, &Verdict::up(10)).await.unwrap();
        }

        let store = Store::open(&path, RETENTION).unwrap();
        assert_eq!(store.seed(Catalog::bundled().entries()).await.unwrap(), 0);
        let history = store.window(1, Utc::now() - chrono::Duration::hours(1)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, Status::Up);
    }

    #[tokio::test]
    async fn old_record_is_gone_after_next_append() {
        let store = Store::open_in_memory(RETENTION).unwrap();
        store.seed(Catalog::bundled().entries()).await.unwrap();

        let now = Utc::now();
        let eight_days_ago = now - chrono::Duration::days(8);
        store
            .append_at(1, &Verdict::down(None, "Timeout"), eight_days_ago)
            .await
            .unwrap();
        let since = now - chrono::Duration::days(30);
        assert_eq!(store.window(1, since).await.unwrap().len(), 1);

        store.append(2, &Verdict::up(3)).await.unwrap();
        assert!(store.window(1, since).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_entries_are_rejected_before_writing() {
        let store = Store::open_in_memory(RETENTION).unwrap();
        let mut entry = Catalog::bundled().entries()[0].clone();
        entry.container = None;

        assert!(matches!(
            store.seed(&[entry]).await,
            Err(Error::InvalidService { .. })
        ));
        assert!(store.list_enabled().await.unwrap().is_empty());
    }
}
