//! Upload progress table
//!
//! Maps a client-supplied upload token to the progress of the multipart body
//! currently streaming under that token. Sessions own a [`ProgressGuard`] and
//! the entry disappears when the guard is dropped.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    Uploading,
    Processing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProgress {
    pub bytes_read: u64,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub files: HashMap<String, FileProgress>,
    pub echo_self: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("token invalid")]
    InvalidToken,

    #[error("Token is taken")]
    TokenTaken,
}

struct ProgressEntry {
    session_id: u64,
    progress: UploadProgress,
}

#[derive(Default)]
pub struct ProgressTable {
    entries: Mutex<HashMap<String, ProgressEntry>>,
    next_session: AtomicU64,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProgressEntry>> {
        // Entries are plain data; a panic elsewhere cannot leave them inconsistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a session under `token`.
    ///
    /// A live entry with the same echo is replaced by the new session; a live
    /// entry with a different echo is a collision.
    pub fn begin(self: &Arc<Self>, token: &str, echo: &str) -> Result<ProgressGuard, ProgressError> {
        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock();

        if let Some(existing) = entries.get(token) {
            if existing.progress.echo_self != echo {
                tracing::warn!(token = %token, "Upload token already in use");
                return Err(ProgressError::TokenTaken);
            }
            tracing::debug!(token = %token, "Replacing progress entry for repeated upload");
        }

        entries.insert(
            token.to_string(),
            ProgressEntry {
                session_id,
                progress: UploadProgress {
                    files: HashMap::new(),
                    echo_self: echo.to_string(),
                },
            },
        );

        Ok(ProgressGuard {
            table: Arc::clone(self),
            token: token.to_string(),
            session_id,
        })
    }

    /// Snapshot of the progress for `token`.
    pub fn get(&self, token: &str) -> Result<UploadProgress, ProgressError> {
        self.lock()
            .get(token)
            .map(|entry| entry.progress.clone())
            .ok_or(ProgressError::InvalidToken)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, token: &str, session_id: u64, file: &str, bytes_read: u64, status: FileStatus) {
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(token) {
            if entry.session_id == session_id {
                entry
                    .progress
                    .files
                    .insert(file.to_string(), FileProgress { bytes_read, status });
            }
        }
    }

    fn finish(&self, token: &str, session_id: u64) {
        let mut entries = self.lock();
        if entries
            .get(token)
            .is_some_and(|entry| entry.session_id == session_id)
        {
            entries.remove(token);
        }
    }
}

/// Ownership of one token's entry for the lifetime of an upload session.
pub struct ProgressGuard {
    table: Arc<ProgressTable>,
    token: String,
    session_id: u64,
}

impl ProgressGuard {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn update(&self, file: &str, bytes_read: u64, status: FileStatus) {
        self.table
            .update(&self.token, self.session_id, file, bytes_read, status);
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.table.finish(&self.token, self.session_id);
    }
}
