//! Image worker pool: a fixed set of long-lived workers draining one bounded
//! FIFO of [`ImageProcessRequest`]s.
//!
//! Submission waits for queue space instead of dropping jobs. Workers stop once
//! every [`ImagePool`] clone has been dropped and the queue is empty.

use std::sync::Arc;
use std::time::Instant;

use bazaar_core::Config;
use bazaar_processing::{derive_assets, DerivedAssets, EncodedAsset, ProcessingError};
use bazaar_storage::{full_size_object_name, thumbnail_object_name, Storage};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::job::{
    AssetKind, AssetReport, FailedImage, FailureReason, ImageProcessRequest, JobHandle, Outcome,
    ProcessedImage,
};

const JPEG_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Image worker pool is closed")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct ImagePoolConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
}

impl Default for ImagePoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            queue_capacity: 500,
        }
    }
}

impl ImagePoolConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            worker_count: config.image_worker_count(),
            queue_capacity: config.image_queue_capacity(),
        }
    }
}

struct QueuedJob {
    request: ImageProcessRequest,
    completion: oneshot::Sender<Outcome>,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<QueuedJob>>>;

#[derive(Clone)]
pub struct ImagePool {
    tx: mpsc::Sender<QueuedJob>,
    config: ImagePoolConfig,
}

impl ImagePool {
    /// Spawn the workers on the current tokio runtime.
    pub fn start(config: ImagePoolConfig, storage: Arc<dyn Storage>) -> Self {
        let config = ImagePoolConfig {
            worker_count: config.worker_count.max(1),
            queue_capacity: config.queue_capacity.max(1),
        };

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));

        for worker_id in 0..config.worker_count {
            let rx = rx.clone();
            let storage = storage.clone();
            tokio::spawn(async move {
                Self::worker_loop(worker_id, rx, storage).await;
            });
        }

        tracing::info!(
            worker_count = config.worker_count,
            queue_capacity = config.queue_capacity,
            "Image worker pool started"
        );

        Self { tx, config }
    }

    pub fn config(&self) -> &ImagePoolConfig {
        &self.config
    }

    /// Number of jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Enqueue a job, waiting while the queue is full.
    #[tracing::instrument(skip(self, request), fields(image.target = %request.target_name))]
    pub async fn submit(&self, request: ImageProcessRequest) -> Result<JobHandle, PoolError> {
        let (completion, rx) = oneshot::channel();
        let handle = JobHandle::new(
            request.original_name.clone(),
            request.target_name.clone(),
            rx,
        );

        self.tx
            .send(QueuedJob {
                request,
                completion,
            })
            .await
            .map_err(|_| {
                tracing::error!("Image worker pool is closed, rejecting job");
                PoolError::Closed
            })?;

        tracing::debug!(queued = self.queued(), "Image job enqueued");
        Ok(handle)
    }

    async fn worker_loop(worker_id: usize, rx: SharedReceiver, storage: Arc<dyn Storage>) {
        loop {
            let job = {
                let mut rx = rx.lock().await;
                rx.recv().await
            };
            let Some(job) = job else {
                break;
            };

            let outcome = process_job(worker_id, job.request, storage.as_ref()).await;
            if job.completion.send(outcome).is_err() {
                tracing::debug!(worker_id, "Image job handle dropped before completion");
            }
        }

        tracing::debug!(worker_id, "Image worker stopped");
    }
}

#[tracing::instrument(
    skip(request, storage),
    fields(image.target = %request.target_name, job.status = tracing::field::Empty)
)]
async fn process_job(
    worker_id: usize,
    request: ImageProcessRequest,
    storage: &dyn Storage,
) -> Outcome {
    let start = Instant::now();
    let ImageProcessRequest {
        scratch,
        original_name,
        target_name,
        kind,
    } = request;

    let derived = tokio::task::spawn_blocking(move || {
        let data = std::fs::read(scratch.path());
        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::warn!(
                error = %e,
                path = %scratch_path.display(),
                "Failed to delete scratch file"
            );
        }

        let data = data.map_err(|e| FailureReason::Read(e.to_string()))?;
        derive_assets(&data, kind).map_err(|e| FailureReason::Decode(e.to_string()))
    })
    .await
    .unwrap_or_else(|e| Err(FailureReason::Decode(format!("processing task failed: {e}"))));

    let DerivedAssets {
        full_size,
        thumbnail,
        ..
    } = match derived {
        Ok(derived) => derived,
        Err(reason) => {
            tracing::Span::current().record("job.status", "failed");
            tracing::warn!(
                original_name = %original_name,
                error = %reason,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Image processing failed"
            );
            return Outcome::Failure(FailedImage {
                original_name,
                target_name,
                reason,
                assets: Vec::new(),
            });
        }
    };

    let assets = vec![
        store_asset(
            storage,
            AssetKind::FullSize,
            full_size_object_name(&target_name),
            full_size,
        )
        .await,
        store_asset(
            storage,
            AssetKind::Thumbnail,
            thumbnail_object_name(&target_name),
            thumbnail,
        )
        .await,
    ];

    if assets.iter().all(AssetReport::is_stored) {
        tracing::Span::current().record("job.status", "success");
        tracing::info!(
            worker_id,
            original_name = %original_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image processed"
        );
        Outcome::Success(ProcessedImage {
            original_name,
            target_name,
            assets,
        })
    } else {
        tracing::Span::current().record("job.status", "partial");
        tracing::warn!(
            worker_id,
            original_name = %original_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image processed with asset failures"
        );
        Outcome::Failure(FailedImage {
            original_name,
            target_name,
            reason: FailureReason::Assets,
            assets,
        })
    }
}

async fn store_asset(
    storage: &dyn Storage,
    kind: AssetKind,
    object_name: String,
    encoded: Result<EncodedAsset, ProcessingError>,
) -> AssetReport {
    let stored = match encoded {
        Ok(asset) => storage
            .put(&object_name, JPEG_CONTENT_TYPE, Bytes::from(asset.data))
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match stored {
        Ok(url) => AssetReport {
            kind,
            object_name,
            url: Some(url),
            error: None,
        },
        Err(error) => {
            tracing::error!(
                object_name = %object_name,
                error = %error,
                "Failed to publish derived image"
            );
            AssetReport {
                kind,
                object_name,
                url: None,
                error: Some(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bazaar_core::StorageBackend;
    use bazaar_processing::SupportedImageType;
    use bazaar_storage::{LocalStorage, StorageError, StorageResult};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::{Cursor, Write};
    use std::path::Path;
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 3) as u8, (y * 5) as u8, 128, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn request(dir: &Path, data: &[u8], target: &str) -> ImageProcessRequest {
        let mut scratch = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(dir)
            .unwrap();
        scratch.write_all(data).unwrap();
        ImageProcessRequest::new(
            scratch,
            format!("{target}.png"),
            target,
            SupportedImageType::Png,
        )
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    async fn local_storage(dir: &Path) -> Arc<dyn Storage> {
        Arc::new(
            LocalStorage::new(dir, "/local".to_string(), String::new())
                .await
                .unwrap(),
        )
    }

    /// Delegates to local storage but refuses thumbnails.
    struct ThumbnailRejectingStorage {
        inner: Arc<dyn Storage>,
    }

    #[async_trait]
    impl Storage for ThumbnailRejectingStorage {
        async fn put(
            &self,
            object_name: &str,
            content_type: &str,
            data: Bytes,
        ) -> StorageResult<String> {
            if object_name.ends_with("_thumb.jpg") {
                return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
            }
            self.inner.put(object_name, content_type, data).await
        }

        async fn delete(&self, object_name: &str) -> StorageResult<()> {
            self.inner.delete(object_name).await
        }

        fn public_url(&self, object_name: &str) -> String {
            self.inner.public_url(object_name)
        }

        fn backend_type(&self) -> StorageBackend {
            self.inner.backend_type()
        }
    }

    /// Holds every upload until the test hands out permits.
    struct GatedStorage {
        inner: Arc<dyn Storage>,
        entered: Arc<Notify>,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Storage for GatedStorage {
        async fn put(
            &self,
            object_name: &str,
            content_type: &str,
            data: Bytes,
        ) -> StorageResult<String> {
            self.entered.notify_one();
            let _permit = self.gate.acquire().await.unwrap();
            self.inner.put(object_name, content_type, data).await
        }

        async fn delete(&self, object_name: &str) -> StorageResult<()> {
            self.inner.delete(object_name).await
        }

        fn public_url(&self, object_name: &str) -> String {
            self.inner.public_url(object_name)
        }

        fn backend_type(&self) -> StorageBackend {
            self.inner.backend_type()
        }
    }

    #[tokio::test]
    async fn test_submit_waits_for_queue_space() {
        let scratch_dir = tempfile::tempdir().unwrap();
        let storage_dir = tempfile::tempdir().unwrap();
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Semaphore::new(0));
        let storage = Arc::new(GatedStorage {
            inner: local_storage(storage_dir.path()).await,
            entered: entered.clone(),
            gate: gate.clone(),
        });
        let pool = ImagePool::start(
            ImagePoolConfig {
                worker_count: 1,
                queue_capacity: 1,
            },
            storage,
        );

        let busy = pool
            .submit(request(scratch_dir.path(), &png_bytes(10, 10), "1_listing_2"))
            .await
            .unwrap();
        // The only worker is now parked inside storage.
        entered.notified().await;

        let queued = pool
            .submit(request(scratch_dir.path(), &png_bytes(10, 10), "2_listing_2"))
            .await
            .unwrap();
        assert_eq!(pool.queued(), 1);

        let third = pool.submit(request(scratch_dir.path(), &png_bytes(10, 10), "3_listing_2"));
        tokio::pin!(third);
        assert!(
            tokio::time::timeout(Duration::from_millis(200), &mut third)
                .await
                .is_err(),
            "submit should wait while the queue is full"
        );

        gate.add_permits(16);
        let third = third.await.unwrap();

        for (handle, target) in [
            (busy, "1_listing_2"),
            (queued, "2_listing_2"),
            (third, "3_listing_2"),
        ] {
            let outcome = handle.outcome().await;
            assert!(outcome.is_success(), "{:?}", outcome);
            assert_eq!(outcome.target_name(), target);
        }
        assert_eq!(pool.queued(), 0);
        assert_eq!(entries(scratch_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_single_worker_processes_every_job_once() {
        let scratch_dir = tempfile::tempdir().unwrap();
        let storage_dir = tempfile::tempdir().unwrap();
        let pool = ImagePool::start(
            ImagePoolConfig {
                worker_count: 1,
                queue_capacity: 2,
            },
            local_storage(storage_dir.path()).await,
        );

        let jobs = [
            request(scratch_dir.path(), &png_bytes(700, 350), "1_listing_9"),
            request(scratch_dir.path(), b"not a png at all", "2_listing_9"),
            request(scratch_dir.path(), &png_bytes(40, 30), "3_listing_9"),
        ];

        let mut handles = Vec::new();
        for job in jobs {
            handles.push(pool.submit(job).await.unwrap());
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.outcome().await);
        }

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].target_name(), "1_listing_9");
        match &outcomes[1] {
            Outcome::Failure(failed) => {
                assert!(matches!(failed.reason, FailureReason::Decode(_)));
                assert!(failed.assets.is_empty());
            }
            other => panic!("corrupt upload should fail, got {:?}", other),
        }
        assert!(outcomes[2].is_success());

        assert_eq!(entries(scratch_dir.path()), 0);
        assert!(storage_dir.path().join("1_listing_9.jpg").exists());
        assert!(storage_dir.path().join("1_listing_9_thumb.jpg").exists());
        assert!(storage_dir.path().join("3_listing_9_thumb.jpg").exists());
        assert!(!storage_dir.path().join("2_listing_9.jpg").exists());
    }

    #[tokio::test]
    async fn test_published_assets_are_bounded() {
        let scratch_dir = tempfile::tempdir().unwrap();
        let storage_dir = tempfile::tempdir().unwrap();
        let pool = ImagePool::start(
            ImagePoolConfig::default(),
            local_storage(storage_dir.path()).await,
        );

        let handle = pool
            .submit(request(scratch_dir.path(), &png_bytes(2000, 1000), "5_listing_1"))
            .await
            .unwrap();
        let outcome = handle.outcome().await;

        match outcome {
            Outcome::Success(image) => {
                assert_eq!(image.url(), Some("/local/5_listing_1.jpg"));
                assert_eq!(image.thumbnail_url(), Some("/local/5_listing_1_thumb.jpg"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let full = image::open(storage_dir.path().join("5_listing_1.jpg")).unwrap();
        assert_eq!((full.width(), full.height()), (600, 300));
        let thumb = image::open(storage_dir.path().join("5_listing_1_thumb.jpg")).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (150, 75));
    }

    #[tokio::test]
    async fn test_partial_publish_is_reported_per_asset() {
        let scratch_dir = tempfile::tempdir().unwrap();
        let storage_dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ThumbnailRejectingStorage {
            inner: local_storage(storage_dir.path()).await,
        });
        let pool = ImagePool::start(ImagePoolConfig::default(), storage);

        let outcome = pool
            .submit(request(scratch_dir.path(), &png_bytes(64, 64), "8_listing_4"))
            .await
            .unwrap()
            .outcome()
            .await;

        match outcome {
            Outcome::Failure(failed) => {
                assert_eq!(failed.reason, FailureReason::Assets);
                assert_eq!(failed.assets.len(), 2);
                assert_eq!(failed.assets[0].kind, AssetKind::FullSize);
                assert!(failed.assets[0].is_stored());
                assert_eq!(failed.assets[1].kind, AssetKind::Thumbnail);
                assert_eq!(failed.assets[1].object_name, "8_listing_4_thumb.jpg");
                assert!(failed.assets[1]
                    .error
                    .as_deref()
                    .is_some_and(|e| e.contains("bucket unavailable")));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(entries(scratch_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_stall_pool() {
        let scratch_dir = tempfile::tempdir().unwrap();
        let storage_dir = tempfile::tempdir().unwrap();
        let pool = ImagePool::start(
            ImagePoolConfig {
                worker_count: 1,
                queue_capacity: 1,
            },
            local_storage(storage_dir.path()).await,
        );

        let dropped = pool
            .submit(request(scratch_dir.path(), &png_bytes(10, 10), "a"))
            .await
            .unwrap();
        drop(dropped);

        let outcome = pool
            .submit(request(scratch_dir.path(), &png_bytes(10, 10), "b"))
            .await
            .unwrap()
            .outcome()
            .await;

        assert!(outcome.is_success());
        assert_eq!(entries(scratch_dir.path()), 0);
    }

    #[test]
    fn test_config_defaults() {
        let config = ImagePoolConfig::default();
        assert_eq!(config.worker_count, 5);
        assert_eq!(config.queue_capacity, 500);
    }
}
