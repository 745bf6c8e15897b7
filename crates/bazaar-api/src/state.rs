//! Application state shared by every handler.

use crate::ingest::IngestionCoordinator;
use crate::notify::Notifier;
use bazaar_core::Config;
use bazaar_storage::Storage;
use bazaar_worker::ImagePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub pool: ImagePool,
    pub ingestion: Arc<IngestionCoordinator>,
    pub notifier: Arc<dyn Notifier>,
}
