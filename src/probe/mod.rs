//! Probe drivers: network reachability and container liveness.

mod docker;
mod network;
mod process;

pub use docker::DockerCli;
pub use network::check_network;
pub use process::{check_process, ContainerRuntime, RuntimeError, BACKEND_UNAVAILABLE};

use crate::{ProcessCheck, Result, Verdict};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Runs single-dimension probes against a service.
///
/// Implementations never fail: every transport or backend problem is folded
/// into the returned status and error text.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn check_network(&self, endpoint: &str) -> Verdict;
    async fn check_process(&self, container: &str) -> ProcessCheck;
}

/// The production prober: an HTTP client plus an optional container runtime.
#[derive(Clone)]
pub struct Probes {
    client: reqwest::Client,
    timeout: Duration,
    runtime: Option<Arc<dyn ContainerRuntime>>,
}

impl Probes {
    pub fn new(timeout: Duration, runtime: Option<Arc<dyn ContainerRuntime>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            timeout,
            runtime,
        })
    }

    #[must_use]
    pub fn runtime(&self) -> Option<Arc<dyn ContainerRuntime>> {
        self.runtime.clone()
    }
}

#[async_trait]
impl Prober for Probes {
    async fn check_network(&self, endpoint: &str) -> Verdict {
        check_network(&self.client, endpoint, self.timeout).await
    }

    async fn check_process(&self, container: &str) -> ProcessCheck {
        check_process(self.runtime.as_deref(), container).await
    }
}
