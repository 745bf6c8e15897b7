//! Bazaar Core Library
//!
//! Configuration, error types and storage backend selection shared by every
//! crate of the image ingestion pipeline.

pub mod config;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PipelineConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
