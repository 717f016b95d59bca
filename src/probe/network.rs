use crate::Verdict;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::debug;

/// GETs `endpoint`, following redirects, and maps the outcome to a verdict.
///
/// 200 and 302 are `up`. Any other response is `down` with its code as the
/// error. A timeout reports the full ceiling as latency.
pub async fn check_network(client: &reqwest::Client, endpoint: &str, timeout: Duration) -> Verdict {
    let start = Instant::now();
    let verdict = match client.get(endpoint).timeout(timeout).send().await {
        Ok(response) => {
            let latency = millis(start.elapsed());
            match response.status() {
                StatusCode::OK | StatusCode::FOUND => Verdict::up(latency),
                code => Verdict::down(Some(latency), format!("HTTP {}", code.as_u16())),
            }
        }
        Err(e) if e.is_timeout() => Verdict::down(Some(millis(timeout)), "Timeout"),
        Err(e) if e.is_connect() => Verdict::down(None, "Connection refused"),
        Err(e) => Verdict::down(None, e.to_string()),
    };
    debug!(endpoint, status = %verdict.status, latency_ms = ?verdict.latency_ms, "network probe");
    verdict
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
