use super::process::{ContainerRuntime, RuntimeError};
use async_trait::async_trait;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Talks to the Docker daemon through the `docker` command line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    timeout: Duration,
}

impl DockerCli {
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Returns a client only if the CLI is installed and the daemon answers.
    pub async fn detect(program: impl Into<String>, timeout: Duration) -> Option<Self> {
        let cli = Self::new(program, timeout);
        match cli.run(&["version", "--format", "{{.Server.Version}}"]).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!(program = %cli.program, version = %version.trim(), "container runtime detected");
                Some(cli)
            }
            Ok(output) => {
                warn!(
                    program = %cli.program,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "container runtime not reachable"
                );
                None
            }
            Err(e) => {
                warn!(program = %cli.program, error = %e, "container runtime not available");
                None
            }
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, RuntimeError> {
        let mut command = Command::new(&self.program);
        command.args(args).kill_on_drop(true);
        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => Ok(output?),
            Err(_) => Err(RuntimeError::Timeout(self.timeout)),
        }
    }
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("No such object") || stderr.contains("No such container")
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn container_state(&self, name: &str) -> Result<Option<String>, RuntimeError> {
        let output = self
            .run(&["inspect", "--type", "container", "--format", "{{.State.Status}}", name])
            .await?;
        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_not_found(&stderr) {
            Ok(None)
        } else {
            Err(RuntimeError::Failed {
                code: output.status.code(),
                stderr,
            })
        }
    }

    async fn list_states(&self) -> Result<Vec<String>, RuntimeError> {
        let output = self.run(&["ps", "--all", "--format", "{{.State}}"]).await?;
        if !output.status.success() {
            return Err(RuntimeError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}
