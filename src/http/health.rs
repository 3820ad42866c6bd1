//! Health check endpoints (`GET /`, `GET /statusCheck`).

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// Fixed `{"status":"ok"}` with the configured status code.
pub async fn status_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    (state.health_status, Json(HealthStatus { status: "ok" }))
}
