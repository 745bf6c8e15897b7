use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::HttpAppError;
use crate::state::AppState;

/// Delete both derived objects of a listing image.
///
/// `name` is the requested name returned by the upload endpoint. Deleting a
/// name that was never stored still succeeds.
#[tracing::instrument(skip(state), fields(operation = "delete_image"))]
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    bazaar_storage::delete_image(state.storage.as_ref(), &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
