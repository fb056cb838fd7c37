//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info};

use uptime_state::*;

use crate::ApiState;

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 500;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> axum::response::Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn internal_error(e: StateError) -> axum::response::Response {
    error!(error = %e, "state store error");
    error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
}

// ── Monitors ───────────────────────────────────────────────────

/// Body of `POST /api/v1/monitors`. Everything is optional at the wire
/// level so missing fields get a 400 with a message, not a bare rejection.
#[derive(Debug, Default, serde::Deserialize)]
pub struct CreateMonitorRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    /// Check interval in seconds.
    pub interval: Option<u64>,
    pub keyword: Option<String>,
}

impl CreateMonitorRequest {
    /// Validate and normalize into a `NewMonitor`.
    pub fn into_new_monitor(self) -> Result<NewMonitor, String> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let (Some(name), Some(url)) = (name, url) else {
            return Err("Missing name or url".to_string());
        };

        let lower = url.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(format!("url must be http:// or https://, got {url}"));
        }

        let interval_secs = self.interval.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err("interval must be at least 1 second".to_string());
        }

        Ok(NewMonitor {
            name,
            url,
            method: self.method.unwrap_or_default(),
            interval_secs,
            keyword: self.keyword.filter(|k| !k.is_empty()),
        })
    }
}

/// GET /api/v1/monitors
pub async fn list_monitors(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_monitors() {
        Ok(monitors) => ApiResponse::ok(monitors).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/v1/monitors
pub async fn create_monitor(
    State(state): State<ApiState>,
    Json(req): Json<CreateMonitorRequest>,
) -> impl IntoResponse {
    let new = match req.into_new_monitor() {
        Ok(new) => new,
        Err(msg) => return error_response(&msg, StatusCode::BAD_REQUEST),
    };
    match state.store.create_monitor(&new, epoch_secs()) {
        Ok(monitor) => {
            info!(monitor_id = monitor.id, name = %monitor.name, url = %monitor.url, "monitor created");
            (StatusCode::CREATED, ApiResponse::ok(monitor)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /api/v1/monitors/:id
pub async fn get_monitor(
    State(state): State<ApiState>,
    Path(id): Path<MonitorId>,
) -> impl IntoResponse {
    match state.store.get_monitor(id) {
        Ok(Some(monitor)) => ApiResponse::ok(monitor).into_response(),
        Ok(None) => error_response("monitor not found", StatusCode::NOT_FOUND),
        Err(e) => internal_error(e),
    }
}

/// DELETE /api/v1/monitors/:id
pub async fn delete_monitor(
    State(state): State<ApiState>,
    Path(id): Path<MonitorId>,
) -> impl IntoResponse {
    match state.store.delete_monitor(id) {
        Ok(true) => {
            info!(monitor_id = id, "monitor deleted");
            ApiResponse::ok("deleted").into_response()
        }
        Ok(false) => error_response("monitor not found", StatusCode::NOT_FOUND),
        Err(e) => internal_error(e),
    }
}

// ── Check log ──────────────────────────────────────────────────

#[derive(Debug, Default, serde::Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/monitors/:id/logs
pub async fn list_logs(
    State(state): State<ApiState>,
    Path(id): Path<MonitorId>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    match state.store.get_monitor(id) {
        Ok(Some(_)) => {}
        Ok(None) => return error_response("monitor not found", StatusCode::NOT_FOUND),
        Err(e) => return internal_error(e),
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    match state.store.list_logs_for_monitor(id, limit) {
        Ok(logs) => ApiResponse::ok(logs).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
