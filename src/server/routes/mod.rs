pub mod health;
pub mod node;
pub mod probe;
pub mod profiles;
pub mod system;


use crate::host_info::HostInfo;
use crate::node::NodeController;
use crate::probe::ConnectionProber;
use crate::store::ProfileStore;
use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use lavadash_core::ErrorResponse;
use rust_embed::RustEmbed;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

#[derive(RustEmbed)]
#[folder = "web"]
struct WebAssets;

/// Shared state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub node: Arc<NodeController>,
    pub prober: ConnectionProber,
    pub host_info: HostInfo,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        node: Arc<NodeController>,
        prober: ConnectionProber,
        host_info: HostInfo,
    ) -> Self {
        Self {
            store,
            node,
            prober,
            host_info,
            start_time: Instant::now(),
        }
    }
}

/// Build the complete axum router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/status", get(node::get_status))
        .route("/api/control", post(node::post_control))
        .route("/api/system-info", get(system::get_system_info))
        .route("/api/logs", get(system::get_logs))
        .route("/api/lavalink/connection", get(node::get_connection))
        .route(
            "/api/lavalink/configs",
            get(profiles::list_profiles).post(profiles::save_profile),
        )
        .route("/api/lavalink/configs/{id}", delete(profiles::delete_profile))
        .route("/api/lavalink/test-connection", post(probe::post_test_connection));

    Router::new()
        .route("/", get(serve_index))
        .route("/health", get(health::get_health))
        .route("/static/{*path}", get(serve_static))
        .merge(api)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `{"error": ...}` with the given status.
pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Run blocking work (file I/O, sysinfo refreshes) off the async workers.
/// A panicked task becomes a 500.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        log::error!("Blocking task failed: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })
}

async fn serve_index() -> Response {
    match WebAssets::get("templates/index.html") {
        Some(content) => serve_embedded_file("index.html", content),
        None => (StatusCode::NOT_FOUND, "dashboard page not available").into_response(),
    }
}

async fn serve_static(Path(path): Path<String>) -> Response {
    if path.split('/').any(|segment| segment == "..") {
        return StatusCode::NOT_FOUND.into_response();
    }
    let file = format!("static/{}", path);
    match WebAssets::get(&file) {
        Some(content) => serve_embedded_file(&path, content),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn serve_embedded_file(path: &str, file: rust_embed::EmbeddedFile) -> Response {
    let mime = match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    };

    ([(axum::http::header::CONTENT_TYPE, mime)], file.data).into_response()
}
