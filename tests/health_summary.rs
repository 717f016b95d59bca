use aernhome::catalog::Catalog;
use aernhome::probe::Probes;
use aernhome::store::Store;
use aernhome::summary::Dashboard;
use aernhome::Status;
use std::sync::Arc;
use std::time::Duration;

const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

fn catalog(base: &str) -> Catalog {
    Catalog::from_json(&format!(
        r#"[
            {{"name": "healthy", "display_name": "Healthy", "check_type": "http",
              "url": "{base}/healthy", "public_url": "https://healthy.example"}},
            {{"name": "broken", "display_name": "Broken", "check_type": "http",
              "url": "{base}/broken"}},
            {{"name": "combined", "display_name": "Combined", "check_type": "both",
              "url": "{base}/healthy", "docker_container": "combined"}},
            {{"name": "relay", "display_name": "Relay", "check_type": "docker",
              "docker_container": "relay"}},
            {{"name": "retired", "display_name": "Retired", "check_type": "http",
              "url": "{base}/healthy", "enabled": false}}
        ]"#
    ))
    .unwrap()
}

#[tokio::test]
async fn summary_probes_records_and_reports_history() {
    let mut server = mockito::Server::new_async().await;
    let _healthy = server
        .mock("GET", "/healthy")
        .with_status(200)
        .expect_at_least(1)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/broken")
        .with_status(503)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&server.url());
    let store = Store::open(&dir.path().join("dashboard.db"), RETENTION).unwrap();
    store.seed(catalog.entries()).await.unwrap();

    let probes = Probes::new(Duration::from_secs(5), None).unwrap();
    let dashboard = Dashboard::new(store, Arc::new(probes), Arc::new(catalog), WINDOW, 4);

    let first = dashboard.get_health_summary().await.unwrap();
    let names: Vec<&str> = first.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["healthy", "broken", "combined", "relay"]);

    assert_eq!(first[0].status, Status::Up);
    assert_eq!(first[0].public_url.as_deref(), Some("https://healthy.example"));
    assert!(first[0].response_time_ms.is_some());

    assert_eq!(first[1].status, Status::Down);
    assert_eq!(first[1].error_message.as_deref(), Some("HTTP 503"));

    assert_eq!(first[2].status, Status::Degraded);
    assert_eq!(first[2].error_message.as_deref(), Some("backend not available"));

    assert_eq!(first[3].status, Status::Unknown);
    assert_eq!(first[3].response_time_ms, None);

    assert!(first.iter().all(|s| s.sparkline.is_empty()));

    let second = dashboard.get_health_summary().await.unwrap();
    let sparklines: Vec<Vec<bool>> = second.iter().map(|s| s.sparkline.clone()).collect();
    assert_eq!(
        sparklines,
        vec![vec![true], vec![false], vec![false], vec![false]]
    );
}
