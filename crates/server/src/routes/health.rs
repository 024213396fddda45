use crate::state::ServerState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Liveness, plus the active accelerator and per-backend warm status
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let embeddings = state.pipeline.embeddings();

    Json(json!({
        "status": "ok",
        "service": "triage-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "ready": state.is_ready(),
        "accelerator": embeddings.accelerator(),
        "embedding_backends": embeddings.status(),
    }))
}

/// 200 once warm-up has finished, 503 before
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if !state.is_ready() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "warming_up",
                "service": "triage-server",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        );
    }

    let report = state.warmup_report().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "service": "triage-server",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": uptime_seconds(),
            "warmup": report,
        })),
    )
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) if state.config.metrics_enabled => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics disabled\n".to_string(),
        ),
    }
}
