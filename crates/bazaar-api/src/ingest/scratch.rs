use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const SCRATCH_PREFIX: &str = "upload-";

/// Directory holding uploaded originals until a worker has read them.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if needed and delete anything left over from a
    /// previous run. Returns the number of entries removed.
    pub async fn prepare(&self) -> io::Result<usize> {
        tokio::fs::create_dir_all(&self.path).await?;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let result = if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };

            match result {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to remove stale scratch entry");
                }
            }
        }

        tracing::info!(
            path = %self.path.display(),
            removed,
            "Scratch directory ready"
        );
        Ok(removed)
    }

    /// New uniquely named scratch file, deleted when dropped.
    pub fn create(&self) -> io::Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempfile_in(&self.path)
    }
}
