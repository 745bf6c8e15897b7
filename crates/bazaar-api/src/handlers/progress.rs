use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::progress::UploadProgress;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_progress: Option<UploadProgress>,
}

/// Progress of the upload currently streaming under `token`.
///
/// An unknown token is not an HTTP error: the body reports `successful: false`.
pub async fn upload_progress(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Json<ProgressResponse> {
    match state.ingestion.progress().get(&token) {
        Ok(progress) => Json(ProgressResponse {
            successful: true,
            error: None,
            upload_progress: Some(progress),
        }),
        Err(e) => {
            tracing::debug!(token = %token, "Progress requested for unknown token");
            Json(ProgressResponse {
                successful: false,
                error: Some(e.to_string()),
                upload_progress: None,
            })
        }
    }
}
