//! Configuration module
//!
//! Server, storage and image pipeline settings, read from the environment
//! (optionally through a `.env` file).

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 4000;
const IMAGE_WORKER_COUNT: usize = 5;
const IMAGE_QUEUE_CAPACITY: usize = 500;
const MAX_FILE_SIZE_BYTES: usize = 5 * 1024 * 1024;
const MAX_LISTING_IMAGES: usize = 8;
const UPLOAD_DRAIN_LIMIT_BYTES: u64 = 50 * 1024 * 1024;
const SCRATCH_DIR: &str = "tmp";
const STORAGE_OBJECT_PREFIX: &str = "public/";
const LOCAL_STORAGE_PATH: &str = "./uploads";
const LOCAL_STORAGE_BASE_URL: &str = "/local";
const ALLOWED_CONTENT_TYPES: &str = "image/gif,image/jpeg,image/png";

/// Settings shared by every binary.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
}

/// Image ingestion pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub storage_object_prefix: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    // Worker pool
    pub image_worker_count: usize,
    pub image_queue_capacity: usize,
    // Upload limits
    pub max_file_size_bytes: usize,
    pub max_listing_images: usize,
    pub upload_drain_limit_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub scratch_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: SERVER_PORT,
                environment: "development".to_string(),
            },
            storage_backend: StorageBackend::Local,
            storage_object_prefix: STORAGE_OBJECT_PREFIX.to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: LOCAL_STORAGE_PATH.to_string(),
            local_storage_base_url: LOCAL_STORAGE_BASE_URL.to_string(),
            image_worker_count: IMAGE_WORKER_COUNT,
            image_queue_capacity: IMAGE_QUEUE_CAPACITY,
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            max_listing_images: MAX_LISTING_IMAGES,
            upload_drain_limit_bytes: UPLOAD_DRAIN_LIMIT_BYTES,
            allowed_content_types: split_list(ALLOWED_CONTENT_TYPES),
            scratch_dir: PathBuf::from(SCRATCH_DIR),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PipelineConfig>);

impl Config {
    fn as_pipeline(&self) -> &PipelineConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PipelineConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_pipeline().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_pipeline().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.as_pipeline().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_pipeline().base.environment
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_pipeline().storage_backend
    }

    pub fn storage_object_prefix(&self) -> &str {
        &self.as_pipeline().storage_object_prefix
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_pipeline().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_pipeline().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_pipeline().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_pipeline().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_pipeline().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.as_pipeline().local_storage_base_url
    }

    pub fn image_worker_count(&self) -> usize {
        self.as_pipeline().image_worker_count
    }

    pub fn image_queue_capacity(&self) -> usize {
        self.as_pipeline().image_queue_capacity
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_pipeline().max_file_size_bytes
    }

    pub fn max_listing_images(&self) -> usize {
        self.as_pipeline().max_listing_images
    }

    pub fn upload_drain_limit_bytes(&self) -> u64 {
        self.as_pipeline().upload_drain_limit_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_pipeline().allowed_content_types
    }

    pub fn scratch_dir(&self) -> &std::path::Path {
        &self.as_pipeline().scratch_dir
    }
}

impl From<PipelineConfig> for Config {
    fn from(config: PipelineConfig) -> Self {
        Config(Box::new(config))
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
        };

        let storage_backend = match optional_var("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let config = PipelineConfig {
            base,
            storage_backend,
            storage_object_prefix: env::var("STORAGE_OBJECT_PREFIX")
                .unwrap_or_else(|_| STORAGE_OBJECT_PREFIX.to_string()),
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION"),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            aws_region: optional_var("AWS_REGION"),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| LOCAL_STORAGE_BASE_URL.to_string()),
            image_worker_count: env::var("IMAGE_WORKER_COUNT")
                .unwrap_or_else(|_| IMAGE_WORKER_COUNT.to_string())
                .parse()
                .unwrap_or(IMAGE_WORKER_COUNT),
            image_queue_capacity: env::var("IMAGE_QUEUE_CAPACITY")
                .unwrap_or_else(|_| IMAGE_QUEUE_CAPACITY.to_string())
                .parse()
                .unwrap_or(IMAGE_QUEUE_CAPACITY),
            max_file_size_bytes: env::var("MAX_FILE_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_FILE_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_FILE_SIZE_BYTES),
            max_listing_images: env::var("MAX_LISTING_IMAGES")
                .unwrap_or_else(|_| MAX_LISTING_IMAGES.to_string())
                .parse()
                .unwrap_or(MAX_LISTING_IMAGES),
            upload_drain_limit_bytes: env::var("UPLOAD_DRAIN_LIMIT_BYTES")
                .unwrap_or_else(|_| UPLOAD_DRAIN_LIMIT_BYTES.to_string())
                .parse()
                .unwrap_or(UPLOAD_DRAIN_LIMIT_BYTES),
            allowed_content_types: split_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| ALLOWED_CONTENT_TYPES.to_string()),
            ),
            scratch_dir: PathBuf::from(
                env::var("SCRATCH_DIR").unwrap_or_else(|_| SCRATCH_DIR.to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.image_worker_count == 0 {
            return Err(anyhow::anyhow!("IMAGE_WORKER_COUNT must be at least 1"));
        }

        if self.image_queue_capacity == 0 {
            return Err(anyhow::anyhow!("IMAGE_QUEUE_CAPACITY must be at least 1"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one MIME type"
            ));
        }

        if self.scratch_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("SCRATCH_DIR must not be empty"));
        }

        if self.storage_object_prefix.contains("..") || self.storage_object_prefix.starts_with('/')
        {
            return Err(anyhow::anyhow!(
                "STORAGE_OBJECT_PREFIX must be relative and must not contain '..'"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
