//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Image workers write finished JPEGs through `put`; the API removes them with `delete`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `object_name` and return its public URL.
    async fn put(&self, object_name: &str, content_type: &str, data: Bytes)
        -> StorageResult<String>;

    /// Delete the object. Deleting an object that does not exist is not an error.
    async fn delete(&self, object_name: &str) -> StorageResult<()>;

    /// Public URL an object would be served from.
    fn public_url(&self, object_name: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject names that could escape the configured prefix.
pub(crate) fn validate_object_name(object_name: &str) -> StorageResult<()> {
    if object_name.is_empty() {
        return Err(StorageError::InvalidKey(
            "Object name must not be empty".to_string(),
        ));
    }
    if object_name.contains("..") || object_name.starts_with('/') || object_name.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Object name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
