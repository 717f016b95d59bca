use crate::{TimedStatus, Verdict};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;

/// Writes one record, then prunes every record older than `retention_ms`
/// relative to `at_ms`. Returns the number of pruned records.
pub fn append(
    conn: &mut Connection,
    service_id: i64,
    verdict: &Verdict,
    at_ms: i64,
    retention_ms: i64,
) -> rusqlite::Result<usize> {
    let latency = verdict.latency_ms.and_then(|l| i64::try_from(l).ok());
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO health_checks
            (service_id, status, response_time_ms, error_message, checked_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![service_id, verdict.status, latency, verdict.error, at_ms],
    )?;
    let pruned = tx.execute(
        "DELETE FROM health_checks WHERE checked_at < ?1",
        params![at_ms.saturating_sub(retention_ms)],
    )?;
    tx.commit()?;
    Ok(pruned)
}

/// Records of one service at or after `since_ms`, oldest first.
pub fn window(
    conn: &Connection,
    service_id: i64,
    since_ms: i64,
) -> rusqlite::Result<Vec<TimedStatus>> {
    let mut stmt = conn.prepare_cached(
        "SELECT status, checked_at
         FROM health_checks
         WHERE service_id = ?1 AND checked_at >= ?2
         ORDER BY checked_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![service_id, since_ms], |row| {
        Ok(TimedStatus {
            status: row.get(0)?,
            time: to_time(row.get(1)?)?,
        })
    })?;
    rows.collect()
}

/// Records of the given services at or after `since_ms`, fetched with a
/// single query and grouped by service, each group oldest first.
pub fn window_all(
    conn: &Connection,
    service_ids: &[i64],
    since_ms: i64,
) -> rusqlite::Result<HashMap<i64, Vec<TimedStatus>>> {
    if service_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; service_ids.len()].join(", ");
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT service_id, status, checked_at
         FROM health_checks
         WHERE checked_at >= ? AND service_id IN ({placeholders})
         ORDER BY checked_at ASC, id ASC"
    ))?;
    let args = std::iter::once(since_ms).chain(service_ids.iter().copied());
    let mut rows = stmt.query(params_from_iter(args))?;

    let mut grouped: HashMap<i64, Vec<TimedStatus>> = HashMap::new();
    while let Some(row) = rows.next()? {
        grouped.entry(row.get(0)?).or_default().push(TimedStatus {
            status: row.get(1)?,
            time: to_time(row.get(2)?)?,
        });
    }
    Ok(grouped)
}

fn to_time(ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, ms))
}
