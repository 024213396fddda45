//! API route handlers
//!
//! - `health`: liveness, readiness and metrics
//! - `nlp`: report analysis, embeddings and duplicate detection

pub mod health;
pub mod nlp;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Field Report Triage",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/nlp/analyze-report",
            "/api/nlp/pipeline",
            "/api/nlp/embed",
            "/api/nlp/find-duplicates",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
