use axum::extract::multipart::{Field, Multipart, MultipartError};
use bazaar_processing::ValidationError;
use bazaar_worker::ImageProcessRequest;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::{
    AcceptedImage, IngestError, IngestionCoordinator, RejectedImage, SessionReport, UploadRequest,
    UPLOAD_CHUNK_SIZE,
};
use crate::progress::{FileStatus, ProgressGuard};

enum Buffered {
    Complete { scratch: NamedTempFile, size: usize },
    TooLarge(ValidationError),
}

pub(super) async fn run(
    coordinator: &IngestionCoordinator,
    mut multipart: Multipart,
    request: &UploadRequest<'_>,
    progress: &ProgressGuard,
) -> SessionReport {
    let mut report = SessionReport::default();
    let mut file_parts = 0usize;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                report.aborted = Some(IngestError::Multipart(e.to_string()));
                break;
            }
        };

        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        file_parts += 1;
        if file_parts > request.remaining_images {
            // Over budget: discard the rest of the body up to the drain limit.
            let limit = coordinator.drain_limit_bytes;
            report.dropped_parts += 1;
            let mut drained = discard(&mut field, limit).await.unwrap_or(limit);
            drop(field);

            while drained < limit {
                match multipart.next_field().await {
                    Ok(Some(mut next)) => {
                        if next.file_name().is_some() {
                            report.dropped_parts += 1;
                        }
                        drained += discard(&mut next, limit - drained)
                            .await
                            .unwrap_or(limit - drained);
                    }
                    Ok(None) | Err(_) => break,
                }
            }

            tracing::info!(
                remaining_images = request.remaining_images,
                dropped_parts = report.dropped_parts,
                drained_bytes = drained,
                "Image budget exceeded, discarded remaining upload"
            );
            break;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let kind = match coordinator.validator.validate_content_type(&content_type) {
            Ok(kind) => kind,
            Err(_) => {
                reject(
                    &mut report,
                    original_name,
                    IngestError::UnsupportedContentType(content_type),
                );
                continue;
            }
        };

        match buffer_part(coordinator, &mut field, &original_name, progress).await {
            Ok(Buffered::Complete { scratch, size }) => {
                progress.update(&original_name, size as u64, FileStatus::Processing);

                let target = request.namer.target_for(&original_name);
                let job = ImageProcessRequest::new(
                    scratch,
                    original_name.clone(),
                    target.name.clone(),
                    kind,
                );

                match coordinator.pool.submit(job).await {
                    Ok(handle) => {
                        tracing::debug!(
                            file = %original_name,
                            target = %target.name,
                            size_bytes = size,
                            "Upload queued for processing"
                        );
                        report.accepted.push(AcceptedImage {
                            original_name,
                            target,
                            handle,
                        });
                    }
                    Err(e) => {
                        report.aborted = Some(e.into());
                        break;
                    }
                }
            }
            Ok(Buffered::TooLarge(e)) => {
                reject(&mut report, original_name, IngestError::FileTooLarge(e));
            }
            Err(e) => {
                report.aborted = Some(e);
                break;
            }
        }
    }

    report
}

fn reject(report: &mut SessionReport, name: String, error: IngestError) {
    tracing::debug!(file = %name, error = %error, "Upload part rejected");
    report.rejected.push(RejectedImage {
        name,
        error: error.to_string(),
    });
}

/// Stream one part into a fresh scratch file, stopping as soon as it would
/// exceed the size limit. A rejected part leaves no scratch file behind.
async fn buffer_part(
    coordinator: &IngestionCoordinator,
    field: &mut Field<'_>,
    name: &str,
    progress: &ProgressGuard,
) -> Result<Buffered, IngestError> {
    let scratch = coordinator.scratch.create()?;
    let mut file = tokio::fs::File::from_std(scratch.as_file().try_clone()?);
    let mut size = 0usize;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| IngestError::Multipart(e.to_string()))?
    {
        for piece in chunk.chunks(UPLOAD_CHUNK_SIZE) {
            if let Err(e) = coordinator.validator.validate_file_size(size + piece.len()) {
                drop(file);
                if let Err(e) = scratch.close() {
                    tracing::warn!(error = %e, file = %name, "Failed to delete scratch file");
                }
                return Ok(Buffered::TooLarge(e));
            }

            file.write_all(piece).await?;
            size += piece.len();
            progress.update(name, size as u64, FileStatus::Uploading);
        }
    }

    file.flush().await?;
    Ok(Buffered::Complete { scratch, size })
}

/// Read and drop up to `budget` bytes of a part.
async fn discard(field: &mut Field<'_>, budget: u64) -> Result<u64, MultipartError> {
    let mut read = 0u64;
    while read < budget {
        match field.chunk().await? {
            Some(chunk) => read += chunk.len() as u64,
            None => break,
        }
    }
    Ok(read)
}
