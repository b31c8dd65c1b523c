//! Ad-hoc connectivity test against a node.
//!
//! Two stages, each bounded by the probe timeout: a raw TCP connect, then a
//! WebSocket handshake that presents the password, sends one `info` request
//! and waits for the first frame back.

use futures::{SinkExt, StreamExt};
use lavadash_core::{ConnectionDetails, ConnectionTestResult, TestDetails};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, USER_AGENT};
use tokio_tungstenite::tungstenite::Message;

/// Identifies the dashboard to the node.
pub const CLIENT_NAME: &str = "Lavalink-Dashboard-Tester/1.0";

const INFO_REQUEST: &str = r#"{"op":"info","reconnect":false}"#;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("socket connection failed: {0}")]
    Socket(String),
    #[error("password is not a valid header value")]
    InvalidPassword,
    #[error("timed out after {}s waiting for {stage}", .timeout.as_secs_f32())]
    Timeout {
        stage: &'static str,
        timeout: Duration,
    },
    #[error("{0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("connection closed before the node responded")]
    Closed,
}

/// Runs connection tests with a fixed per-stage timeout.
#[derive(Clone, Debug)]
pub struct ConnectionProber {
    timeout: Duration,
    websocket_path: String,
}

impl ConnectionProber {
    pub fn new(timeout: Duration, websocket_path: impl Into<String>) -> Self {
        let mut websocket_path = websocket_path.into();
        if !websocket_path.starts_with('/') {
            websocket_path.insert(0, '/');
        }
        Self {
            timeout,
            websocket_path,
        }
    }

    /// Test `target` and report the outcome. Never fails: every error is
    /// logged and folded into an unsuccessful result.
    pub async fn test(&self, target: &ConnectionDetails) -> ConnectionTestResult {
        match self.run(target).await {
            Ok(response) => {
                log::info!("Connection test to {}:{} succeeded", target.host, target.port);
                ConnectionTestResult {
                    success: true,
                    message: "Connection successful".to_string(),
                    details: TestDetails {
                        host: target.host.clone(),
                        port: target.port,
                        response: Some(response),
                        error: None,
                    },
                }
            }
            Err(e) => {
                log::error!(
                    "Connection test to {}:{} failed: {}",
                    target.host,
                    target.port,
                    e
                );
                ConnectionTestResult {
                    success: false,
                    message: format!("Connection failed: {}", e),
                    details: TestDetails {
                        host: target.host.clone(),
                        port: target.port,
                        response: None,
                        error: Some(e.to_string()),
                    },
                }
            }
        }
    }

    async fn run(&self, target: &ConnectionDetails) -> Result<serde_json::Value, ProbeError> {
        self.check_socket(target).await?;
        self.handshake(target).await
    }

    /// Stage 1: plain TCP connect. Name resolution is inside the bound.
    async fn check_socket(&self, target: &ConnectionDetails) -> Result<(), ProbeError> {
        let connect = TcpStream::connect((target.host.as_str(), target.port));
        match timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::Socket(e.to_string())),
            Err(_) => Err(ProbeError::Socket(format!(
                "timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }

    /// Stage 2: WebSocket handshake plus one request/response exchange.
    async fn handshake(&self, target: &ConnectionDetails) -> Result<serde_json::Value, ProbeError> {
        if target.secure {
            ensure_crypto_provider();
        }

        let url = self.websocket_url(target);
        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&target.password).map_err(|_| ProbeError::InvalidPassword)?,
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_NAME));
        headers.insert("Client-Name", HeaderValue::from_static(CLIENT_NAME));
        headers.insert("User-Id", HeaderValue::from_static("0"));

        let (mut ws, _response) = timeout(self.timeout, tokio_tungstenite::connect_async(request))
            .await
            .map_err(|_| self.timed_out("handshake"))??;

        ws.send(Message::Text(INFO_REQUEST.to_string().into())).await?;

        let frame = timeout(self.timeout, read_first_frame(&mut ws))
            .await
            .map_err(|_| self.timed_out("response"))??;

        if let Err(e) = ws.close(None).await {
            log::debug!("Closing probe WebSocket failed: {}", e);
        }

        Ok(parse_frame(frame))
    }

    fn websocket_url(&self, target: &ConnectionDetails) -> String {
        let scheme = if target.secure { "wss" } else { "ws" };
        let host = if target.host.contains(':') && !target.host.starts_with('[') {
            format!("[{}]", target.host)
        } else {
            target.host.clone()
        };
        format!("{}://{}:{}{}", scheme, host, target.port, self.websocket_path)
    }

    fn timed_out(&self, stage: &'static str) -> ProbeError {
        ProbeError::Timeout {
            stage,
            timeout: self.timeout,
        }
    }
}

/// Wait for the first data frame, skipping control frames.
async fn read_first_frame<S>(ws: &mut WebSocketStream<S>) -> Result<String, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => return Ok(text.to_string()),
            Message::Binary(data) => return Ok(String::from_utf8_lossy(&data).into_owned()),
            Message::Close(_) => return Err(ProbeError::Closed),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }
    }
    Err(ProbeError::Closed)
}

/// Structured JSON when the frame parses, the raw text otherwise.
fn parse_frame(frame: String) -> serde_json::Value {
    serde_json::from_str(&frame).unwrap_or(serde_json::Value::String(frame))
}

/// rustls needs a process-wide provider before the first TLS handshake.
fn ensure_crypto_provider() {
    let _ = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::ring::default_provider(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::http::StatusCode;

    const PASSWORD: &str = "admin123";

    fn details(port: u16, password: &str) -> ConnectionDetails {
        ConnectionDetails {
            host: "127.0.0.1".to_string(),
            port,
            password: password.to_string(),
            secure: false,
        }
    }

    /// A port with nothing listening on it.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Minimal node: checks the password, waits for one request and answers
    /// with `reply`. Plain TCP connections (the socket stage) are ignored.
    async fn spawn_node(reply: Option<&'static str>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { return };
                tokio::spawn(async move {
                    let check_auth = |req: &Request, resp: Response| {
                        let authorized = req
                            .headers()
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            == Some(PASSWORD);
                        if authorized {
                            Ok(resp)
                        } else {
                            let mut err = ErrorResponse::new(Some("unauthorized".to_string()));
                            *err.status_mut() = StatusCode::UNAUTHORIZED;
                            Err(err)
                        }
                    };
                    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, check_auth).await
                    else {
                        return;
                    };
                    let Some(Ok(Message::Text(request))) = ws.next().await else { return };
                    assert!(request.contains("\"op\":\"info\""));
                    match reply {
                        Some(reply) => {
                            let _ = ws.send(Message::Text(reply.to_string().into())).await;
                            let _ = ws.next().await;
                        }
                        // Stay silent until the client gives up.
                        None => while ws.next().await.is_some() {},
                    }
                });
            }
        });

        port
    }

    #[tokio::test]
    async fn closed_port_fails_at_socket_stage() {
        let port = closed_port().await;
        let prober = ConnectionProber::new(Duration::from_secs(5), "/websocket");

        let started = Instant::now();
        let result = prober.test(&details(port, PASSWORD)).await;

        assert!(!result.success);
        assert!(result.message.contains("socket connection failed"));
        assert_eq!(result.details.host, "127.0.0.1");
        assert_eq!(result.details.port, port);
        assert!(result.details.error.is_some());
        assert!(result.details.response.is_none());
        assert!(started.elapsed() <= Duration::from_secs(5) + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn unroutable_host_returns_within_timeout() {
        let timeout = Duration::from_millis(300);
        let prober = ConnectionProber::new(timeout, "/websocket");
        let target = ConnectionDetails {
            host: "10.255.255.1".to_string(),
            port: 2333,
            password: PASSWORD.to_string(),
            secure: false,
        };

        let started = Instant::now();
        let result = prober.test(&target).await;

        assert!(!result.success);
        assert!(started.elapsed() <= timeout + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn handshake_success_echoes_target_and_parses_response() {
        let port = spawn_node(Some(r#"{"op":"ready","resumed":false,"sessionId":"abc"}"#)).await;
        let prober = ConnectionProber::new(Duration::from_secs(5), "/websocket");

        let result = prober.test(&details(port, PASSWORD)).await;

        assert!(result.success, "unexpected failure: {:?}", result.details.error);
        assert_eq!(result.message, "Connection successful");
        assert_eq!(result.details.host, "127.0.0.1");
        assert_eq!(result.details.port, port);
        let response = result.details.response.unwrap();
        assert_eq!(response["op"], "ready");
        assert_eq!(response["sessionId"], "abc");
        assert!(result.details.error.is_none());
    }

    #[tokio::test]
    async fn non_json_response_is_kept_as_text() {
        let port = spawn_node(Some("hello")).await;
        let prober = ConnectionProber::new(Duration::from_secs(5), "websocket");

        let result = prober.test(&details(port, PASSWORD)).await;

        assert!(result.success);
        assert_eq!(result.details.response, Some(serde_json::json!("hello")));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let port = spawn_node(Some("{}")).await;
        let prober = ConnectionProber::new(Duration::from_secs(5), "/websocket");

        let result = prober.test(&details(port, "wrong")).await;

        assert!(!result.success);
        assert!(result.message.starts_with("Connection failed: "));
        assert!(result.details.error.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn silent_node_times_out() {
        let port = spawn_node(None).await;
        let timeout = Duration::from_millis(300);
        let prober = ConnectionProber::new(timeout, "/websocket");

        let started = Instant::now();
        let result = prober.test(&details(port, PASSWORD)).await;

        assert!(!result.success);
        assert!(result.message.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn websocket_url_handles_scheme_and_ipv6() {
        let prober = ConnectionProber::new(Duration::from_secs(1), "/v4/websocket");
        let mut target = details(2333, PASSWORD);
        assert_eq!(prober.websocket_url(&target), "ws://127.0.0.1:2333/v4/websocket");

        target.secure = true;
        target.host = "::1".to_string();
        assert_eq!(prober.websocket_url(&target), "wss://[::1]:2333/v4/websocket");
    }
}
