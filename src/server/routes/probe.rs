use crate::server::routes::{AppState, error_response};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lavadash_core::TestConnectionRequest;

/// Run a connectivity test. Requires `host`, `port` and `password`; no
/// defaults are filled in for missing fields.
pub async fn post_test_connection(
    State(state): State<AppState>,
    payload: Result<Json<TestConnectionRequest>, JsonRejection>,
) -> Response {
    let target = match payload {
        Ok(Json(request)) => request.into_details(),
        Err(e) => {
            log::warn!("Rejected test-connection body: {}", e);
            None
        }
    };
    let Some(target) = target else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid connection details");
    };

    Json(state.prober.test(&target).await).into_response()
}
