use crate::types::ConnectionProfile;
use serde::{Deserialize, Serialize};

// ── API request/response types ──────────────────────────────────────────────

/// GET /health response
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /api/status response.
///
/// A fresh snapshot of the managed container. When the runtime cannot be
/// reached the snapshot carries `status: "error"` and a `message` instead of
/// the container attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Published port mapping exactly as the runtime reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<serde_json::Value>,
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NodeStatus {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            image: None,
            created: None,
            ports: None,
            running: false,
            message: Some(message.into()),
        }
    }
}

/// GET /api/system-info response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_release: String,
    pub language_runtime_version: String,
    pub cpu_cores: usize,
    pub total_memory: String,
    pub available_memory: String,
}

/// GET /api/logs response
#[derive(Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: String,
}

/// POST /api/control request body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub action: Option<String>,
}

/// POST /api/control response
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
}

/// Host, port and credentials for reaching a node.
///
/// Returned by GET /api/lavalink/connection and used as the validated form of
/// a test-connection request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    pub host: String,
    pub port: u16,
    pub password: String,
    #[serde(default)]
    pub secure: bool,
}

/// POST /api/lavalink/configs request body, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub secure: Option<bool>,
}

impl ProfileDraft {
    /// Returns `None` when any of `name`, `host`, `port` or `password` is
    /// missing. The id stays empty if the client did not supply one.
    pub fn into_profile(self) -> Option<ConnectionProfile> {
        Some(ConnectionProfile {
            id: self.id.unwrap_or_default(),
            name: self.name?,
            host: self.host?,
            port: self.port?,
            password: self.password?,
            secure: self.secure.unwrap_or(false),
        })
    }
}

/// POST /api/lavalink/test-connection request body, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct TestConnectionRequest {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub secure: Option<bool>,
}

impl TestConnectionRequest {
    /// Returns `None` when any of `host`, `port` or `password` is missing.
    pub fn into_details(self) -> Option<ConnectionDetails> {
        Some(ConnectionDetails {
            host: self.host?,
            port: self.port?,
            password: self.password?,
            secure: self.secure.unwrap_or(false),
        })
    }
}

/// POST /api/lavalink/configs response
#[derive(Serialize, Deserialize)]
pub struct SaveProfileResponse {
    pub message: String,
    pub config: ConnectionProfile,
}

/// Generic success message
#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Generic error response
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /api/lavalink/test-connection response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub details: TestDetails,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestDetails {
    pub host: String,
    pub port: u16,
    /// First frame the node sent back; JSON when it parses, a string otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_missing_required_field_is_rejected() {
        let draft: ProfileDraft =
            serde_json::from_str(r#"{"name":"local","host":"127.0.0.1","port":2333}"#).unwrap();
        assert!(draft.into_profile().is_none());

        let draft: ProfileDraft =
            serde_json::from_str(r#"{"host":"127.0.0.1","port":2333,"password":"pw"}"#).unwrap();
        assert!(draft.into_profile().is_none());
    }

    #[test]
    fn draft_keeps_client_id() {
        let draft: ProfileDraft = serde_json::from_str(
            r#"{"id":"abc","name":"local","host":"h","port":1,"password":"pw","secure":true}"#,
        )
        .unwrap();
        let profile = draft.into_profile().unwrap();
        assert_eq!(profile.id, "abc");
        assert!(profile.secure);
    }

    #[test]
    fn error_status_omits_container_fields() {
        let json = serde_json::to_value(NodeStatus::error("daemon down")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["running"], false);
        assert_eq!(json["message"], "daemon down");
        assert!(json.get("image").is_none());
        assert!(json.get("ports").is_none());
    }

    #[test]
    fn test_details_serializes_only_present_outcome() {
        let result = ConnectionTestResult {
            success: false,
            message: "Connection failed: refused".into(),
            details: TestDetails {
                host: "localhost".into(),
                port: 2333,
                response: None,
                error: Some("refused".into()),
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["details"]["error"], "refused");
        assert!(json["details"].get("response").is_none());
    }
}
