//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub index_size: usize,
    pub generator_configured: bool,
}

/// Liveness check: always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: contextforge_common::VERSION,
    })
}

/// Readiness check: ready once an index with at least one chunk is loaded
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let ready = state.index_size > 0;

    Json(ReadyResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        index_size: state.index_size,
        generator_configured: state.pipeline.has_generator(),
    })
}
