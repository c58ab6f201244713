//! Liveness and backend status endpoints

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::core::shared::AppState;
use crate::storage::BackendMode;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn db_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.backend.snapshot();
    Json(serde_json::json!({
        "connected": snapshot.mode == BackendMode::Primary,
        "mode": snapshot.mode,
        "url": snapshot.url,
        "since": snapshot.since,
        "reason": snapshot.reason,
    }))
}
