use crate::server::routes::{AppState, error_response};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lavadash_core::{ConnectionDetails, ControlRequest, ControlResponse, NodeStatus};

pub async fn get_status(State(state): State<AppState>) -> Json<NodeStatus> {
    Json(state.node.get_status().await)
}

pub async fn post_control(
    State(state): State<AppState>,
    payload: Result<Json<ControlRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Rejected control request body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let success = match request.action.as_deref() {
        Some(action) => state.node.control(action).await,
        None => {
            log::warn!("Control request without an action");
            false
        }
    };

    Json(ControlResponse { success }).into_response()
}

pub async fn get_connection(State(state): State<AppState>) -> Json<ConnectionDetails> {
    Json(state.node.connection_details().await)
}
