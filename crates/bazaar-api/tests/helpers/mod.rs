//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p bazaar-api --test uploads_test` or
//! `cargo test -p bazaar-api`. Each app gets its own temp dir for storage and
//! scratch files.

#![allow(dead_code)]

pub mod fixtures;
pub mod notifier;
pub mod storage;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bazaar_api::constants;
use bazaar_api::setup::{build_state, routes};
use bazaar_api::state::AppState;
use bazaar_core::{Config, PipelineConfig, StorageBackend};
use bazaar_storage::{LocalStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use notifier::RecordingNotifier;

pub const TEST_BASE_URL: &str = "http://localhost:4000/local";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub notifier: Arc<RecordingNotifier>,
    pub storage_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Path of a stored object on disk.
    pub fn object_path(&self, object_name: &str) -> PathBuf {
        self.storage_dir.join("public").join(object_name)
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch_dir)
            .expect("Failed to read scratch dir")
            .count()
    }
}

/// Setup test app with local storage and small limits.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(customize: impl FnOnce(&mut PipelineConfig)) -> TestApp {
    setup_test_app_with_storage(customize, |storage| storage).await
}

/// Like [`setup_test_app_with`], with the local storage passed through `wrap`
/// before the pipeline is built.
pub async fn setup_test_app_with_storage(
    customize: impl FnOnce(&mut PipelineConfig),
    wrap: impl FnOnce(Arc<dyn Storage>) -> Arc<dyn Storage>,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_dir = temp_dir.path().join("storage");
    let scratch_dir = temp_dir.path().join("tmp");

    let mut pipeline = PipelineConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: storage_dir.to_string_lossy().into_owned(),
        local_storage_base_url: TEST_BASE_URL.to_string(),
        scratch_dir: scratch_dir.clone(),
        image_worker_count: 2,
        image_queue_capacity: 16,
        max_file_size_bytes: 256 * 1024,
        max_listing_images: 4,
        upload_drain_limit_bytes: 1024 * 1024,
        ..PipelineConfig::default()
    };
    customize(&mut pipeline);
    let config = Config::from(pipeline);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            storage_dir.clone(),
            TEST_BASE_URL.to_string(),
            config.storage_object_prefix().to_string(),
        )
        .await
        .expect("Failed to create local storage"),
    );
    let storage = wrap(storage);

    let notifier = Arc::new(RecordingNotifier::default());
    let state = build_state(config.clone(), storage, notifier.clone())
        .await
        .expect("Failed to build app state");
    let app = routes::setup_routes(&config, state.clone());
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        notifier,
        storage_dir,
        scratch_dir,
        _temp_dir: temp_dir,
    }
}

pub fn image_part(data: Vec<u8>, file_name: &str, mime_type: &str) -> Part {
    Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string())
}

/// Multipart form with one `file` part per entry.
pub fn upload_form(parts: Vec<Part>) -> MultipartForm {
    parts
        .into_iter()
        .fold(MultipartForm::new(), |form, part| form.add_part("file", part))
}
