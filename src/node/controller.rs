use crate::node::{ContainerInspect, NodeRuntime};
use lavadash_core::{ConnectionDetails, ControlAction, NodeStatus};
use std::sync::Arc;

/// Reports on and drives the managed node through a [`NodeRuntime`].
///
/// Nothing here is cached: every call goes to the runtime once.
pub struct NodeController {
    runtime: Arc<dyn NodeRuntime>,
    defaults: ConnectionDetails,
}

impl NodeController {
    /// `defaults.port` doubles as the port the node listens on inside the
    /// container.
    pub fn new(runtime: Arc<dyn NodeRuntime>, defaults: ConnectionDetails) -> Self {
        Self { runtime, defaults }
    }

    /// Fresh status snapshot; runtime failures become an error snapshot.
    pub async fn get_status(&self) -> NodeStatus {
        match self.runtime.inspect().await {
            Ok(inspect) => NodeStatus {
                running: inspect.status == "running",
                status: inspect.status,
                image: Some(inspect.image),
                created: Some(inspect.created),
                ports: Some(inspect.ports),
                message: None,
            },
            Err(e) => {
                log::error!("Error getting node status: {}", e);
                NodeStatus::error(e.to_string())
            }
        }
    }

    /// Parse and run a lifecycle action. Unknown actions never reach the
    /// runtime.
    pub async fn control(&self, action: &str) -> bool {
        match action.parse::<ControlAction>() {
            Ok(action) => self.apply(action).await,
            Err(e) => {
                log::warn!("Rejected control request: {}", e);
                false
            }
        }
    }

    pub async fn apply(&self, action: ControlAction) -> bool {
        match self.runtime.apply(action).await {
            Ok(()) => {
                log::info!("Node {} successfully", action.past_tense());
                true
            }
            Err(e) => {
                log::error!("Error running {} on node: {}", action, e);
                false
            }
        }
    }

    /// Connection details for the managed node, derived from its published
    /// ports. Falls back to the configured defaults when it cannot be
    /// inspected.
    pub async fn connection_details(&self) -> ConnectionDetails {
        match self.runtime.inspect().await {
            Ok(inspect) => derive_connection_details(&inspect, &self.defaults),
            Err(e) => {
                log::error!("Error generating connection details: {}", e);
                self.defaults.clone()
            }
        }
    }
}

/// Prefer the host binding of `<port>/tcp`, then the container IP, then the
/// defaults.
pub fn derive_connection_details(
    inspect: &ContainerInspect,
    defaults: &ConnectionDetails,
) -> ConnectionDetails {
    let mut host = inspect
        .ip_address
        .clone()
        .unwrap_or_else(|| defaults.host.clone());
    let mut port = defaults.port;

    let key = format!("{}/tcp", defaults.port);
    if let Some(binding) = inspect
        .ports
        .get(&key)
        .and_then(|b| b.as_array())
        .and_then(|b| b.first())
    {
        if let Some(host_ip) = binding.get("HostIp").and_then(|v| v.as_str()) {
            host = host_ip.to_string();
        }
        if let Some(host_port) = binding
            .get("HostPort")
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse().ok())
        {
            port = host_port;
        }
    }

    ConnectionDetails {
        host,
        port,
        password: defaults.password.clone(),
        secure: defaults.secure,
    }
}
