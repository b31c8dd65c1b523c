use crate::server::routes::{AppState, run_blocking};
use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use lavadash_core::LogsResponse;
use serde::Deserialize;

/// Lines returned when `?lines=` is absent or not a number.
pub const DEFAULT_LOG_LINES: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub lines: Option<String>,
}

impl LogsQuery {
    pub fn lines(&self) -> usize {
        self.lines
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_LOG_LINES)
    }
}

pub async fn get_system_info(State(state): State<AppState>) -> Response {
    let host_info = state.host_info.clone();
    match run_blocking(move || host_info.system_info()).await {
        Ok(info) => Json(info).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    Json(LogsResponse {
        logs: state.host_info.tail_log(query.lines()).await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lines: Option<&str>) -> LogsQuery {
        LogsQuery {
            lines: lines.map(str::to_string),
        }
    }

    #[test]
    fn lines_defaults_when_absent_or_invalid() {
        assert_eq!(query(None).lines(), 100);
        assert_eq!(query(Some("abc")).lines(), 100);
        assert_eq!(query(Some("-5")).lines(), 100);
        assert_eq!(query(Some("25")).lines(), 25);
    }
}
