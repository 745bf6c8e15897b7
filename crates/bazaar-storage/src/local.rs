use crate::traits::{validate_object_name, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    prefix: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/bazaar/uploads")
    /// * `base_url` - Base URL for serving files (e.g., "/local")
    /// * `prefix` - Prepended to every object name (e.g., "public/")
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        prefix: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        if prefix.contains("..") || prefix.starts_with('/') {
            return Err(StorageError::ConfigError(format!(
                "Invalid object prefix: {}",
                prefix
            )));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            prefix,
        })
    }

    /// Convert an object name to its filesystem path
    fn object_path(&self, object_name: &str) -> StorageResult<PathBuf> {
        validate_object_name(object_name)?;
        Ok(self
            .base_path
            .join(format!("{}{}", self.prefix, object_name)))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        object_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let path = self.object_path(object_name)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            object_name = %object_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.public_url(object_name))
    }

    async fn delete(&self, object_name: &str) -> StorageResult<()> {
        let path = self.object_path(object_name)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            object_name = %object_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), object_name)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
