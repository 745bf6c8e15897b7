//! Upload ingestion
//!
//! An [`IngestionCoordinator`] turns one multipart body into a set of queued
//! image jobs. File parts are validated, streamed into scratch files and handed
//! to the [`ImagePool`]; form fields are ignored. Progress is published in the
//! [`ProgressTable`] under the client's upload token while the body streams.

mod scratch;
mod session;

pub use scratch::ScratchDir;

use std::sync::Arc;

use axum::extract::Multipart;
use bazaar_core::Config;
use bazaar_processing::{UploadValidator, ValidationError};
use bazaar_worker::{ImagePool, JobHandle, PoolError};

use crate::progress::{ProgressError, ProgressTable};

/// Largest single write into a scratch file.
pub const UPLOAD_CHUNK_SIZE: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Upload token is already in use")]
    TokenCollision,

    #[error(transparent)]
    FileTooLarge(ValidationError),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Failed to read multipart body: {0}")]
    Multipart(String),

    #[error("Scratch file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image queue unavailable: {0}")]
    Queue(#[from] PoolError),
}

impl From<ProgressError> for IngestError {
    fn from(_: ProgressError) -> Self {
        IngestError::TokenCollision
    }
}

#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_file_size: usize,
    pub allowed_content_types: Vec<String>,
    pub drain_limit_bytes: u64,
}

impl IngestLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes(),
            allowed_content_types: config.allowed_content_types().to_vec(),
            drain_limit_bytes: config.upload_drain_limit_bytes(),
        }
    }
}

/// Identity assigned to an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    pub id: String,
    pub name: String,
}

/// Chooses the published name for each accepted file.
pub trait TargetNamer: Send + Sync {
    fn target_for(&self, original_name: &str) -> ImageTarget;
}

pub struct UploadRequest<'a> {
    pub token: String,
    pub echo: String,
    pub remaining_images: usize,
    pub namer: &'a dyn TargetNamer,
}

#[derive(Debug)]
pub struct AcceptedImage {
    pub original_name: String,
    pub target: ImageTarget,
    pub handle: JobHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedImage {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct SessionReport {
    pub accepted: Vec<AcceptedImage>,
    pub rejected: Vec<RejectedImage>,
    /// Parts beyond the image budget that were discarded unread.
    pub dropped_parts: usize,
    /// Set when the session stopped early; jobs accepted before that point
    /// are still listed in `accepted`.
    pub aborted: Option<IngestError>,
}

pub struct IngestionCoordinator {
    progress: Arc<ProgressTable>,
    pool: ImagePool,
    validator: UploadValidator,
    drain_limit_bytes: u64,
    scratch: ScratchDir,
}

impl IngestionCoordinator {
    pub fn new(
        progress: Arc<ProgressTable>,
        pool: ImagePool,
        limits: IngestLimits,
        scratch: ScratchDir,
    ) -> Self {
        Self {
            progress,
            pool,
            validator: UploadValidator::new(limits.max_file_size, limits.allowed_content_types),
            drain_limit_bytes: limits.drain_limit_bytes,
            scratch,
        }
    }

    pub fn progress(&self) -> &Arc<ProgressTable> {
        &self.progress
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Consume one multipart body.
    ///
    /// Only a token collision fails the call outright; any later failure is
    /// reported through [`SessionReport::aborted`] so accepted jobs are not lost.
    #[tracing::instrument(skip(self, multipart, request), fields(token = %request.token))]
    pub async fn ingest(
        &self,
        multipart: Multipart,
        request: UploadRequest<'_>,
    ) -> Result<SessionReport, IngestError> {
        let progress = self.progress.begin(&request.token, &request.echo)?;
        let start = std::time::Instant::now();

        let report = session::run(self, multipart, &request, &progress).await;

        tracing::info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            dropped_parts = report.dropped_parts,
            aborted = report.aborted.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload session finished"
        );

        Ok(report)
    }
}
