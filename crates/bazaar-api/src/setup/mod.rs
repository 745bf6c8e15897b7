//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod validation;

use crate::ingest::{IngestLimits, IngestionCoordinator, ScratchDir};
use crate::notify::{LogNotifier, Notifier};
use crate::progress::ProgressTable;
use crate::state::AppState;
use anyhow::{Context, Result};
use bazaar_core::Config;
use bazaar_storage::{create_storage, Storage};
use bazaar_worker::{ImagePool, ImagePoolConfig};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    let state = build_state(config.clone(), storage, Arc::new(LogNotifier)).await?;
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}

/// Wire the pipeline around an existing storage backend and notifier.
///
/// Sweeps the scratch directory and starts the image workers.
pub async fn build_state(
    config: Config,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<AppState>> {
    let scratch = ScratchDir::new(config.scratch_dir());
    scratch
        .prepare()
        .await
        .with_context(|| format!("Failed to prepare scratch dir {}", scratch.path().display()))?;

    let pool = ImagePool::start(ImagePoolConfig::from_config(&config), Arc::clone(&storage));
    let ingestion = Arc::new(IngestionCoordinator::new(
        Arc::new(ProgressTable::new()),
        pool.clone(),
        IngestLimits::from_config(&config),
        scratch,
    ));

    tracing::info!(
        storage = %storage.backend_type(),
        workers = pool.config().worker_count,
        queue_capacity = pool.config().queue_capacity,
        "Image pipeline ready"
    );

    Ok(Arc::new(AppState {
        config,
        storage,
        pool,
        ingestion,
        notifier,
    }))
}
