//! Bazaar API Library
//!
//! HTTP surface of the listing photo pipeline: multipart upload ingestion,
//! upload progress polling and image deletion.

pub mod constants;
pub mod error;
mod handlers;
pub mod ingest;
pub mod notify;
pub mod progress;
pub mod setup;
pub mod state;
mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use ingest::{IngestError, IngestionCoordinator, ScratchDir};
pub use notify::{LogNotifier, Notifier, ProcessEvent};
pub use progress::{FileStatus, ProgressTable, UploadProgress};
pub use state::AppState;
