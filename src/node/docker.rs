use crate::node::{ContainerInspect, NodeRuntime, RuntimeError};
use crate::process;
use async_trait::async_trait;
use lavadash_core::ControlAction;
use serde::Deserialize;
use std::time::Duration;

/// [`NodeRuntime`] backed by the `docker` CLI.
pub struct DockerCli {
    container: String,
    timeout: Duration,
}

impl DockerCli {
    pub fn new(container: impl Into<String>, timeout: Duration) -> Self {
        Self {
            container: container.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, RuntimeError> {
        let mut cmd = process::command("docker");
        cmd.args(args);

        let output = process::output_with_timeout(&mut cmd, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("No such container") || stderr.contains("No such object") {
                return Err(RuntimeError::NotFound(self.container.clone()));
            }
            return Err(RuntimeError::Failed {
                command: format!("docker {}", args.first().copied().unwrap_or_default()),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl NodeRuntime for DockerCli {
    async fn inspect(&self) -> Result<ContainerInspect, RuntimeError> {
        let stdout = self
            .run(&["inspect", "--type", "container", &self.container])
            .await?;
        parse_inspect_output(&stdout)
            .ok_or_else(|| RuntimeError::NotFound(self.container.clone()))?
    }

    async fn apply(&self, action: ControlAction) -> Result<(), RuntimeError> {
        self.run(&[action.as_str(), &self.container]).await?;
        Ok(())
    }
}

/// Raw JSON shape of one entry from `docker inspect`.
#[derive(Deserialize)]
struct InspectEntry {
    #[serde(rename = "Created", default)]
    created: String,
    #[serde(rename = "State")]
    state: Option<InspectState>,
    #[serde(rename = "Config")]
    config: Option<InspectConfig>,
    #[serde(rename = "NetworkSettings")]
    network_settings: Option<InspectNetwork>,
}

#[derive(Deserialize)]
struct InspectState {
    #[serde(rename = "Status")]
    status: Option<String>,
}

#[derive(Deserialize)]
struct InspectConfig {
    #[serde(rename = "Image")]
    image: Option<String>,
}

#[derive(Deserialize)]
struct InspectNetwork {
    #[serde(rename = "IPAddress")]
    ip_address: Option<String>,
    #[serde(rename = "Ports")]
    ports: Option<serde_json::Value>,
}

/// Parse `docker inspect` output (a JSON array).
///
/// Returns `None` when the array is empty.
pub fn parse_inspect_output(output: &str) -> Option<Result<ContainerInspect, RuntimeError>> {
    let entries: Vec<InspectEntry> = match serde_json::from_str(output.trim()) {
        Ok(entries) => entries,
        Err(e) => {
            return Some(Err(RuntimeError::Parse(format!(
                "failed to parse docker inspect JSON: {}",
                e
            ))));
        }
    };

    let entry = entries.into_iter().next()?;
    let network = entry.network_settings;

    Some(Ok(ContainerInspect {
        status: entry
            .state
            .and_then(|s| s.status)
            .unwrap_or_else(|| "unknown".to_string()),
        image: entry
            .config
            .and_then(|c| c.image)
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        created: entry.created,
        ports: network
            .as_ref()
            .and_then(|n| n.ports.clone())
            .unwrap_or(serde_json::Value::Null),
        ip_address: network
            .and_then(|n| n.ip_address)
            .filter(|ip| !ip.is_empty()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: &str = r#"[
        {
            "Id": "4f1c",
            "Created": "2024-05-01T10:00:00.123456789Z",
            "State": {"Status": "running", "Running": true},
            "Config": {"Image": "ghcr.io/lavalink-devs/lavalink:4"},
            "NetworkSettings": {
                "IPAddress": "172.17.0.2",
                "Ports": {"2333/tcp": [{"HostIp": "0.0.0.0", "HostPort": "2333"}]}
            }
        }
    ]"#;

    #[test]
    fn parse_running_container() {
        let inspect = parse_inspect_output(RUNNING).unwrap().unwrap();
        assert_eq!(inspect.status, "running");
        assert_eq!(inspect.image, "ghcr.io/lavalink-devs/lavalink:4");
        assert_eq!(inspect.created, "2024-05-01T10:00:00.123456789Z");
        assert_eq!(inspect.ip_address.as_deref(), Some("172.17.0.2"));
        assert_eq!(inspect.ports["2333/tcp"][0]["HostPort"], "2333");
    }

    #[test]
    fn parse_stopped_container_without_network() {
        let output = r#"[{"Created": "2024-05-01T10:00:00Z", "State": {"Status": "exited"}, "Config": {"Image": ""}, "NetworkSettings": {"IPAddress": "", "Ports": {}}}]"#;
        let inspect = parse_inspect_output(output).unwrap().unwrap();
        assert_eq!(inspect.status, "exited");
        assert_eq!(inspect.image, "Unknown");
        assert!(inspect.ip_address.is_none());
        assert_eq!(inspect.ports, serde_json::json!({}));
    }

    #[test]
    fn parse_empty_array_is_none() {
        assert!(parse_inspect_output("[]").is_none());
        assert!(parse_inspect_output("  []\n").is_none());
    }

    #[test]
    fn parse_garbage_is_error() {
        let result = parse_inspect_output("Error: something").unwrap();
        assert!(matches!(result, Err(RuntimeError::Parse(_))));
    }
}
