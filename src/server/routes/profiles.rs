use crate::server::routes::{AppState, error_response, run_blocking};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lavadash_core::{MessageResponse, ProfileDraft, SaveProfileResponse};

pub async fn list_profiles(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.load()).await {
        Ok(profiles) => Json(profiles).into_response(),
        Err(resp) => resp,
    }
}

/// Create or overwrite a profile. Requires `name`, `host`, `port` and
/// `password`; anything else is a 400 and leaves the store untouched.
pub async fn save_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileDraft>, JsonRejection>,
) -> Response {
    let profile = match payload {
        Ok(Json(draft)) => draft.into_profile(),
        Err(e) => {
            log::warn!("Rejected profile body: {}", e);
            None
        }
    };
    let Some(profile) = profile else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid configuration");
    };

    let store = state.store.clone();
    match run_blocking(move || store.upsert(profile)).await {
        Ok(config) => Json(SaveProfileResponse {
            message: "Configuration saved successfully".to_string(),
            config,
        })
        .into_response(),
        Err(resp) => resp,
    }
}

pub async fn delete_profile(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.delete(&id)).await {
        Ok(true) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Configuration deleted successfully".to_string(),
            }),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Configuration not found"),
        Err(resp) => resp,
    }
}
