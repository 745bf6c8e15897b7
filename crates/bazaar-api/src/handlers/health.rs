//! Health check handler and response type.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub storage: String,
    pub queued_jobs: usize,
    pub active_uploads: usize,
}

/// Liveness probe with a view of the image queue.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "alive".to_string(),
        storage: state.storage.backend_type().to_string(),
        queued_jobs: state.pool.queued(),
        active_uploads: state.ingestion.progress().len(),
    })
}
