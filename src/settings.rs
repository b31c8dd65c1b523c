use lavadash_core::ConnectionDetails;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "LAVADASH_SETTINGS";

/// Dashboard settings.
///
/// Every field has a default so a missing or partial settings file still
/// yields a usable configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Listen address for the HTTP server (default: "0.0.0.0")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Listen port for the HTTP server (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Name of the managed node container (default: "lavalink")
    #[serde(default = "default_container_name")]
    pub container_name: String,
    /// JSON file holding saved connection profiles
    #[serde(default = "default_profiles_path")]
    pub profiles_path: PathBuf,
    /// Log file written by the node itself
    #[serde(default = "default_node_log_path")]
    pub node_log_path: PathBuf,
    /// Connection details reported when the container cannot be inspected
    #[serde(default)]
    pub node: NodeDefaults,
    /// Path of the node's WebSocket endpoint (default: "/websocket")
    #[serde(default = "default_websocket_path")]
    pub websocket_path: String,
    /// Timeout for each connectivity probe stage (default: 5000)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Timeout for a single container runtime command (default: 30000)
    #[serde(default = "default_runtime_timeout_ms")]
    pub runtime_timeout_ms: u64,
}

/// Default connection details for the managed node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDefaults {
    #[serde(default = "default_node_host")]
    pub host: String,
    #[serde(default = "default_node_port")]
    pub port: u16,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub secure: bool,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            host: default_node_host(),
            port: default_node_port(),
            password: String::new(),
            secure: false,
        }
    }
}

impl NodeDefaults {
    pub fn to_details(&self) -> ConnectionDetails {
        ConnectionDetails {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            secure: self.secure,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            container_name: default_container_name(),
            profiles_path: default_profiles_path(),
            node_log_path: default_node_log_path(),
            node: NodeDefaults::default(),
            websocket_path: default_websocket_path(),
            probe_timeout_ms: default_probe_timeout_ms(),
            runtime_timeout_ms: default_runtime_timeout_ms(),
        }
    }
}

impl DashboardSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime_timeout_ms)
    }

    /// Apply `LAVADASH_*` / `LAVALINK_*` overrides from the given lookup.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LAVADASH_BIND") {
            self.bind_address = v;
        }
        if let Some(v) = lookup("LAVADASH_PORT") {
            match v.parse() {
                Ok(port) => self.port = port,
                Err(e) => log::warn!("Ignoring LAVADASH_PORT={:?}: {}", v, e),
            }
        }
        if let Some(v) = lookup("LAVALINK_CONTAINER") {
            self.container_name = v;
        }
        if let Some(v) = lookup("LAVALINK_HOST") {
            self.node.host = v;
        }
        if let Some(v) = lookup("LAVALINK_PORT") {
            match v.parse() {
                Ok(port) => self.node.port = port,
                Err(e) => log::warn!("Ignoring LAVALINK_PORT={:?}: {}", v, e),
            }
        }
        if let Some(v) = lookup("LAVALINK_PASSWORD") {
            self.node.password = v;
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_container_name() -> String {
    "lavalink".to_string()
}

fn default_profiles_path() -> PathBuf {
    PathBuf::from("lavalink_configs.json")
}

fn default_node_log_path() -> PathBuf {
    PathBuf::from("./logs/spring.log")
}

fn default_node_host() -> String {
    "localhost".to_string()
}

fn default_node_port() -> u16 {
    2333
}

fn default_websocket_path() -> String {
    "/websocket".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_runtime_timeout_ms() -> u64 {
    30_000
}

/// Get the config directory path
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lavadash")
}

/// Get the settings file path, honouring `LAVADASH_SETTINGS`.
pub fn get_settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| get_config_dir().join("settings.json"))
}

/// Load settings from the default location and apply environment overrides.
pub fn load_settings() -> DashboardSettings {
    let mut settings = load_settings_from(&get_settings_path());
    settings.apply_env_overrides(|key| std::env::var(key).ok());
    settings
}

/// Load settings from `path`, falling back to defaults on any problem.
pub fn load_settings_from(path: &Path) -> DashboardSettings {
    if !path.exists() {
        log::info!("Settings file not found at {}, using defaults", path.display());
        return DashboardSettings::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::error!("Failed to read settings file {}: {}", path.display(), e);
            return DashboardSettings::default();
        }
    };

    match serde_json::from_str::<DashboardSettings>(&content) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to parse settings file {}: {}", path.display(), e);
            log::error!("Using default settings. Your settings file has been preserved.");
            DashboardSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.container_name, "lavalink");
        assert_eq!(settings.node.port, 2333);
        assert_eq!(settings.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"port": 8080, "node": {"password": "s3cret"}}"#,
        )
        .unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.bind_address, "0.0.0.0");
        assert_eq!(settings.node.password, "s3cret");
        assert_eq!(settings.node.host, "localhost");
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let settings = load_settings_from(&path);
        assert_eq!(settings.port, 5000);
    }

    #[test]
    fn env_overrides_apply_and_bad_numbers_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("LAVADASH_PORT", "not-a-port"),
            ("LAVALINK_PORT", "2444"),
            ("LAVALINK_PASSWORD", "from-env"),
            ("LAVALINK_CONTAINER", "node-1"),
        ]
        .into_iter()
        .collect();

        let mut settings = DashboardSettings::default();
        settings.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.port, 5000);
        assert_eq!(settings.node.port, 2444);
        assert_eq!(settings.node.password, "from-env");
        assert_eq!(settings.container_name, "node-1");
    }
}
