use super::{history, registry};
use crate::catalog::CatalogEntry;
use crate::{Result, Service, TimedStatus, Verdict};
use rusqlite::Connection;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

pub(super) enum StoreMessage {
    Seed {
        entries: Vec<CatalogEntry>,
        respond_to: oneshot::Sender<Result<usize>>,
    },
    ListEnabled {
        respond_to: oneshot::Sender<Result<Vec<Service>>>,
    },
    Append {
        service_id: i64,
        verdict: Verdict,
        at_ms: i64,
        respond_to: oneshot::Sender<Result<()>>,
    },
    Window {
        service_id: i64,
        since_ms: i64,
        respond_to: oneshot::Sender<Result<Vec<TimedStatus>>>,
    },
    WindowAll {
        service_ids: Vec<i64>,
        since_ms: i64,
        respond_to: oneshot::Sender<Result<HashMap<i64, Vec<TimedStatus>>>>,
    },
}

/// Owns the database connection. Every message is handled to completion
/// before the next one, so writes never interleave.
pub(super) struct StoreActor {
    receiver: mpsc::UnboundedReceiver<StoreMessage>,
    conn: Connection,
    retention_ms: i64,
}

impl StoreActor {
    pub(super) fn new(
        receiver: mpsc::UnboundedReceiver<StoreMessage>,
        conn: Connection,
        retention_ms: i64,
    ) -> Self {
        Self {
            receiver,
            conn,
            retention_ms,
        }
    }

    fn handle_message(&mut self, msg: StoreMessage) {
        // Errors when sending can happen if the caller stopped waiting for
        // the response. We can safely ignore these.
        match msg {
            StoreMessage::Seed {
                entries,
                respond_to,
            } => {
                let result: Result<usize> =
                    registry::seed(&mut self.conn, &entries).map_err(Into::into);
                if let Ok(inserted) = &result {
                    info!(inserted, catalog = entries.len(), "seeded service registry");
                }
                let _ = respond_to.send(result);
            }
            StoreMessage::ListEnabled { respond_to } => {
                let _ = respond_to.send(registry::list_enabled(&self.conn).map_err(Into::into));
            }
            StoreMessage::Append {
                service_id,
                verdict,
                at_ms,
                respond_to,
            } => {
                let result =
                    history::append(&mut self.conn, service_id, &verdict, at_ms, self.retention_ms);
                if let Ok(pruned) = &result {
                    if *pruned > 0 {
                        debug!(pruned, "pruned expired health checks");
                    }
                }
                let _ = respond_to.send(result.map(|_| ()).map_err(Into::into));
            }
            StoreMessage::Window {
                service_id,
                since_ms,
                respond_to,
            } => {
                let result = history::window(&self.conn, service_id, since_ms);
                let _ = respond_to.send(result.map_err(Into::into));
            }
            StoreMessage::WindowAll {
                service_ids,
                since_ms,
                respond_to,
            } => {
                let result = history::window_all(&self.conn, &service_ids, since_ms);
                let _ = respond_to.send(result.map_err(Into::into));
            }
        }
    }

    /// Runs on a dedicated thread until every handle has been dropped.
    pub(super) fn run(mut self) {
        while let Some(msg) = self.receiver.blocking_recv() {
            self.handle_message(msg);
        }
        debug!("store actor stopped");
    }
}
