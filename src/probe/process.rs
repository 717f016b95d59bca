use crate::{ProcessCheck, Status};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Error text reported when no container runtime is present on this host.
pub const BACKEND_UNAVAILABLE: &str = "backend not available";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("cannot run container runtime: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("container runtime exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("container runtime timed out after {0:?}")]
    Timeout(Duration),
}

/// A container runtime able to report container states.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// State of the named container (`running`, `exited`, ...), or `None`
    /// if no such container exists.
    async fn container_state(&self, name: &str) -> Result<Option<String>, RuntimeError>;

    /// States of every container, running or not.
    async fn list_states(&self) -> Result<Vec<String>, RuntimeError>;
}

/// Checks that `container` exists and is running.
///
/// A missing runtime is an expected condition on some hosts and yields
/// `unknown`, never an error.
pub async fn check_process(runtime: Option<&dyn ContainerRuntime>, container: &str) -> ProcessCheck {
    let Some(runtime) = runtime else {
        return ProcessCheck::with_error(Status::Unknown, BACKEND_UNAVAILABLE);
    };

    let check = match runtime.container_state(container).await {
        Ok(Some(state)) if state == "running" => ProcessCheck::up(),
        Ok(Some(state)) => ProcessCheck::with_error(Status::Down, format!("status: {state}")),
        Ok(None) => ProcessCheck::with_error(Status::Down, "not found"),
        Err(e) => ProcessCheck::with_error(Status::Down, e.to_string()),
    };
    debug!(container, status = %check.status, "process probe");
    check
}
