use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ready: bool,
    pub checks: HealthChecks,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// `GET /health`
///
/// Readiness probe that checks database connectivity.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_ready = state.store().ping().await.is_ok();

    Json(HealthResponse {
        ready: db_ready,
        checks: HealthChecks { database: db_ready },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
