//! Status and lifecycle control of the managed node container.

pub mod controller;
pub mod docker;

pub use controller::NodeController;
pub use docker::DockerCli;

use crate::process::CommandError;
use async_trait::async_trait;
use lavadash_core::ControlAction;

/// The subset of container attributes the dashboard reports.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerInspect {
    pub status: String,
    pub image: String,
    pub created: String,
    /// Published port mapping as reported by the runtime
    /// (`{"2333/tcp": [{"HostIp": ..., "HostPort": ...}]}`).
    pub ports: serde_json::Value,
    pub ip_address: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },
    #[error("no such container: {0}")]
    NotFound(String),
    #[error("unexpected runtime output: {0}")]
    Parse(String),
}

/// Container runtime holding the node.
#[async_trait]
pub trait NodeRuntime: Send + Sync {
    /// Fetch the container's current attributes.
    async fn inspect(&self) -> Result<ContainerInspect, RuntimeError>;

    /// Run one lifecycle operation. Called exactly once per request.
    async fn apply(&self, action: ControlAction) -> Result<(), RuntimeError>;
}
