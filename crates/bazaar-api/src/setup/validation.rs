//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use bazaar_core::{Config, StorageBackend};
use std::path::Path;

/// Validate critical configuration values
///
/// Runs the field checks of [`Config::validate`] and then the checks that
/// involve more than one setting.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    // The scratch directory is emptied at startup, so it must never hold stored images.
    if config.storage_backend() == StorageBackend::Local
        && Path::new(config.local_storage_path()).starts_with(config.scratch_dir())
    {
        return Err(anyhow::anyhow!(
            "LOCAL_STORAGE_PATH must not be inside SCRATCH_DIR ({})",
            config.scratch_dir().display()
        ));
    }

    if config.max_listing_images() == 0 {
        tracing::warn!("MAX_LISTING_IMAGES is 0 - every upload will be discarded");
    }

    Ok(())
}
