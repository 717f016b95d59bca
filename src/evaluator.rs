//! Combines probe outcomes into one verdict per service.

use crate::probe::Prober;
use crate::{CheckMode, Service, Status, Verdict};

/// Evaluates `service` according to its check mode.
///
/// In `both` mode the process probe only runs once the endpoint is `up`; a
/// reachable endpoint with an unhealthy container is `degraded`. A service
/// with no usable mode, or missing the endpoint or container its mode needs,
/// stays `unknown`.
pub async fn evaluate(prober: &dyn Prober, service: &Service) -> Verdict {
    match (service.mode, &service.endpoint, &service.container) {
        (Some(CheckMode::Network), Some(endpoint), _) => prober.check_network(endpoint).await,
        (Some(CheckMode::Process), _, Some(container)) => prober.check_process(container).await.into(),
        (Some(CheckMode::Both), Some(endpoint), Some(container)) => {
            let network = prober.check_network(endpoint).await;
            if network.status != Status::Up {
                return network;
            }
            let process = prober.check_process(container).await;
            if process.status == Status::Up {
                network
            } else {
                Verdict {
                    status: Status::Degraded,
                    latency_ms: network.latency_ms,
                    error: process.error,
                }
            }
        }
        _ => Verdict::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProcessCheck;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProber {
        network: Verdict,
        process: ProcessCheck,
        network_calls: AtomicUsize,
        process_calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn new(network: Verdict, process: ProcessCheck) -> Self {
            Self {
                network,
                process,
                network_calls: AtomicUsize::new(0),
                process_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn check_network(&self, _endpoint: &str) -> Verdict {
            self.network_calls.fetch_add(1, Ordering::SeqCst);
            self.network.clone()
        }

        async fn check_process(&self, _container: &str) -> ProcessCheck {
            self.process_calls.fetch_add(1, Ordering::SeqCst);
            self.process.clone()
        }
    }

    fn service(mode: CheckMode, endpoint: Option<&str>, container: Option<&str>) -> Service {
        Service {
            id: 1,
            name: "svc".to_string(),
            display_name: "Service".to_string(),
            endpoint: endpoint.map(str::to_string),
            container: container.map(str::to_string),
            mode: Some(mode),
            icon: None,
            enabled: true,
        }
    }

    fn both() -> Service {
        service(CheckMode::Both, Some("http://svc"), Some("svc"))
    }

    #[tokio::test]
    async fn network_mode_returns_network_outcome_verbatim() {
        let down = Verdict::down(Some(12), "HTTP 500");
        let prober = ScriptedProber::new(down.clone(), ProcessCheck::up());
        let svc = service(CheckMode::Network, Some("http://svc"), Some("svc"));

        assert_eq!(evaluate(&prober, &svc).await, down);
        assert_eq!(prober.process_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn process_mode_has_no_latency() {
        let exited = ProcessCheck::with_error(Status::Down, "status: exited");
        let prober = ScriptedProber::new(Verdict::up(5), exited);
        let svc = service(CheckMode::Process, Some("http://svc"), Some("svc"));

        let verdict = evaluate(&prober, &svc).await;
        assert_eq!(verdict, Verdict::down(None, "status: exited"));
        assert_eq!(prober.network_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn both_mode_short_circuits_when_endpoint_is_down() {
        let refused = Verdict::down(None, "Connection refused");
        let prober = ScriptedProber::new(refused.clone(), ProcessCheck::up());

        assert_eq!(evaluate(&prober, &both()).await, refused);
        assert_eq!(prober.network_calls.load(Ordering::SeqCst), 1);
        assert_eq!(prober.process_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn both_mode_degrades_when_container_is_unhealthy() {
        let prober = ScriptedProber::new(
            Verdict::up(42),
            ProcessCheck::with_error(Status::Down, "not found"),
        );

        let verdict = evaluate(&prober, &both()).await;
        assert_eq!(verdict.status, Status::Degraded);
        assert_eq!(verdict.latency_ms, Some(42));
        assert_eq!(verdict.error.as_deref(), Some("not found"));
        assert_eq!(prober.process_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_mode_degrades_when_backend_is_missing() {
        let prober = ScriptedProber::new(
            Verdict::up(7),
            ProcessCheck::with_error(Status::Unknown, "backend not available"),
        );

        let verdict = evaluate(&prober, &both()).await;
        assert_eq!(verdict.status, Status::Degraded);
        assert_eq!(verdict.error.as_deref(), Some("backend not available"));
    }

    #[tokio::test]
    async fn both_mode_is_up_when_both_probes_are_up() {
        let prober = ScriptedProber::new(Verdict::up(9), ProcessCheck::up());
        assert_eq!(evaluate(&prober, &both()).await, Verdict::up(9));
    }

    #[tokio::test]
    async fn missing_target_stays_unknown_without_probing() {
        let prober = ScriptedProber::new(Verdict::up(1), ProcessCheck::up());
        let cases = [
            service(CheckMode::Network, None, Some("svc")),
            service(CheckMode::Process, Some("http://svc"), None),
            service(CheckMode::Both, Some("http://svc"), None),
            service(CheckMode::Both, None, Some("svc")),
        ];

        for svc in &cases {
            assert_eq!(evaluate(&prober, svc).await, Verdict::default());
        }
        assert_eq!(prober.network_calls.load(Ordering::SeqCst), 0);
        assert_eq!(prober.process_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unrecognized_mode_stays_unknown_without_probing() {
        let prober = ScriptedProber::new(Verdict::up(1), ProcessCheck::up());
        let svc = Service {
            mode: None,
            ..both()
        };

        assert_eq!(evaluate(&prober, &svc).await, Verdict::default());
        assert_eq!(prober.network_calls.load(Ordering::SeqCst), 0);
        assert_eq!(prober.process_calls.load(Ordering::SeqCst), 0);
    }
}
