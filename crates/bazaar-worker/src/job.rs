//! Job and completion types shared between the pool and its callers.

use bazaar_processing::SupportedImageType;
use tempfile::NamedTempFile;
use tokio::sync::oneshot;

/// One uploaded original waiting to be processed.
///
/// The scratch file is owned by the request; the worker that picks it up
/// deletes it once the original has been read, whatever the outcome.
#[derive(Debug)]
pub struct ImageProcessRequest {
    pub scratch: NamedTempFile,
    pub original_name: String,
    pub target_name: String,
    pub kind: SupportedImageType,
}

impl ImageProcessRequest {
    pub fn new(
        scratch: NamedTempFile,
        original_name: impl Into<String>,
        target_name: impl Into<String>,
        kind: SupportedImageType,
    ) -> Self {
        Self {
            scratch,
            original_name: original_name.into(),
            target_name: target_name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    FullSize,
    Thumbnail,
}

/// Result of producing and storing one derived asset.
#[derive(Debug, Clone)]
pub struct AssetReport {
    pub kind: AssetKind,
    pub object_name: String,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl AssetReport {
    pub fn is_stored(&self) -> bool {
        self.url.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("Failed to read uploaded file: {0}")]
    Read(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("One or more derived images could not be stored")]
    Assets,

    #[error("Image processing was abandoned")]
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub original_name: String,
    pub target_name: String,
    pub assets: Vec<AssetReport>,
}

impl ProcessedImage {
    fn asset_url(&self, kind: AssetKind) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.kind == kind)
            .and_then(|a| a.url.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        self.asset_url(AssetKind::FullSize)
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.asset_url(AssetKind::Thumbnail)
    }
}

#[derive(Debug, Clone)]
pub struct FailedImage {
    pub original_name: String,
    pub target_name: String,
    pub reason: FailureReason,
    pub assets: Vec<AssetReport>,
}

/// Exactly one outcome is delivered per submitted job.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(ProcessedImage),
    Failure(FailedImage),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn original_name(&self) -> &str {
        match self {
            Outcome::Success(image) => &image.original_name,
            Outcome::Failure(image) => &image.original_name,
        }
    }

    pub fn target_name(&self) -> &str {
        match self {
            Outcome::Success(image) => &image.target_name,
            Outcome::Failure(image) => &image.target_name,
        }
    }
}

/// Receiving side of a job's completion slot.
///
/// Dropping the handle is allowed; the worker's send becomes a no-op.
#[derive(Debug)]
pub struct JobHandle {
    original_name: String,
    target_name: String,
    rx: oneshot::Receiver<Outcome>,
}

impl JobHandle {
    pub(crate) fn new(
        original_name: String,
        target_name: String,
        rx: oneshot::Receiver<Outcome>,
    ) -> Self {
        Self {
            original_name,
            target_name,
            rx,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Wait for the job to finish. Resolves to `Failure(Abandoned)` if the
    /// worker went away without reporting.
    pub async fn outcome(self) -> Outcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    target_name = %self.target_name,
                    "Image job ended without reporting an outcome"
                );
                Outcome::Failure(FailedImage {
                    original_name: self.original_name,
                    target_name: self.target_name,
                    reason: FailureReason::Abandoned,
                    assets: Vec::new(),
                })
            }
        }
    }
}
