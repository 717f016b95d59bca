use crate::catalog::CatalogEntry;
use crate::{CheckMode, Service};
use rusqlite::{params, Connection};
use tracing::warn;

/// Inserts every entry whose name is not registered yet. Existing rows are
/// left exactly as they are. Returns the number of rows inserted.
pub fn seed(conn: &mut Connection, entries: &[CatalogEntry]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO services
                (name, display_name, url, check_type, docker_container, icon_emoji, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for entry in entries {
            inserted += stmt.execute(params![
                entry.name,
                entry.display_name,
                entry.endpoint,
                entry.mode,
                entry.container,
                entry.icon,
                entry.enabled,
            ])?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Enabled services in registration order. A row whose check type was
/// edited to something unrecognized is still listed, with no mode.
pub fn list_enabled(conn: &Connection) -> rusqlite::Result<Vec<Service>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, display_name, url, docker_container, check_type, icon_emoji, enabled
         FROM services
         WHERE enabled = 1
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let check_type: String = row.get(5)?;
        let mode = match check_type.parse::<CheckMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!(error = %e, "service has an unusable check type");
                None
            }
        };
        Ok(Service {
            id: row.get(0)?,
            name: row.get(1)?,
            display_name: row.get(2)?,
            endpoint: row.get(3)?,
            container: row.get(4)?,
            mode,
            icon: row.get(6)?,
            enabled: row.get(7)?,
        })
    })?;
    rows.collect()
}
