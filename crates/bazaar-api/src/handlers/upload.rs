use std::sync::Arc;

use axum::{
    extract::multipart::MultipartRejection,
    extract::{Multipart, Path, State},
    Json,
};
use bazaar_core::AppError;
use bazaar_storage::delete_image;
use bazaar_worker::Outcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HttpAppError, ValidatedQuery};
use crate::ingest::{AcceptedImage, ImageTarget, TargetNamer, UploadRequest};
use crate::notify::ProcessEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    token: String,
    #[serde(default)]
    echo: String,
    remaining: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub id: String,
    pub name: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct FailedUpload {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub images: Vec<UploadedImage>,
    pub failed_images: Vec<FailedUpload>,
}

/// Names accepted files `{image_id}_{media}_{media_id}` with a fresh image id.
struct ListingNamer<'a> {
    media: &'a str,
    media_id: &'a str,
}

impl TargetNamer for ListingNamer<'_> {
    fn target_for(&self, _original_name: &str) -> ImageTarget {
        let id = Uuid::new_v4().to_string();
        let name = format!("{}_{}_{}", id, self.media, self.media_id);
        ImageTarget { id, name }
    }
}

fn validate_segment(field: &str, value: &str) -> Result<(), AppError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "{} may only contain letters, digits, '-' and '_'",
            field
        )))
    }
}

/// Upload listing photos
///
/// Streams every file part of the multipart body into the image pool and
/// answers as soon as the body has been consumed. Processing results are
/// delivered later through the notifier, keyed by the `echo` query value.
///
/// # Errors
/// - `AppError::TokenCollision` - the token belongs to another live upload
/// - `AppError::BadRequest` - the body is not readable multipart
/// - `AppError::InvalidInput` - missing token, malformed path segments or no
///   remaining image slots
#[tracing::instrument(
    skip_all,
    fields(media = %media, media_id = %media_id, operation = "upload_images")
)]
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    Path((media, media_id)): Path<(String, String)>,
    ValidatedQuery(query): ValidatedQuery<UploadQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    validate_segment("media", &media)?;
    validate_segment("media_id", &media_id)?;
    if query.token.trim().is_empty() {
        return Err(AppError::InvalidInput("token is required".to_string()).into());
    }
    let multipart = multipart?;

    let max_images = state.config.max_listing_images();
    let remaining_images = query.remaining.unwrap_or(max_images).min(max_images);
    if remaining_images == 0 {
        return Err(AppError::InvalidInput(
            "no remaining image slots for this listing".to_string(),
        )
        .into());
    }
    let namer = ListingNamer {
        media: &media,
        media_id: &media_id,
    };

    let report = state
        .ingestion
        .ingest(
            multipart,
            UploadRequest {
                token: query.token,
                echo: query.echo.clone(),
                remaining_images,
                namer: &namer,
            },
        )
        .await?;

    // Accepted jobs are followed up even when the session was cut short.
    let mut images = Vec::with_capacity(report.accepted.len());
    for accepted in report.accepted {
        images.push(UploadedImage {
            id: accepted.target.id.clone(),
            name: accepted.original_name.clone(),
            target: accepted.target.name.clone(),
        });
        spawn_completion(&state, accepted, &query.echo, &media, &media_id);
    }

    if let Some(error) = report.aborted {
        return Err(error.into());
    }

    let failed_images = report
        .rejected
        .into_iter()
        .map(|rejected| FailedUpload {
            name: rejected.name,
            error: rejected.error,
        })
        .collect();

    Ok(Json(UploadResponse {
        successful: true,
        error: None,
        images,
        failed_images,
    }))
}

/// Wait for the job outcome in the background and notify the uploader.
/// A failed job has its derived objects deleted first.
fn spawn_completion(
    state: &AppState,
    accepted: AcceptedImage,
    echo: &str,
    media: &str,
    media_id: &str,
) {
    let storage = Arc::clone(&state.storage);
    let notifier = Arc::clone(&state.notifier);
    let echo = echo.to_string();
    let media = media.to_string();
    let media_id = media_id.to_string();

    tokio::spawn(async move {
        let AcceptedImage {
            original_name,
            target,
            handle,
        } = accepted;

        let event = match handle.outcome().await {
            Outcome::Success(image) => ProcessEvent::Done {
                url: image.url().unwrap_or_default().to_string(),
                thumbnail_url: image.thumbnail_url().unwrap_or_default().to_string(),
                name: original_name,
                id: target.id,
            },
            Outcome::Failure(failed) => {
                tracing::warn!(
                    file = %original_name,
                    target = %target.name,
                    reason = %failed.reason,
                    "Image processing failed, removing derived objects"
                );
                if let Err(e) = delete_image(storage.as_ref(), &target.name).await {
                    tracing::warn!(error = %e, target = %target.name, "Rollback delete failed");
                }
                ProcessEvent::Failed {
                    name: original_name,
                    media,
                    media_id,
                }
            }
        };

        notifier.notify(&echo, event).await;
    });
}
