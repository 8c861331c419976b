//! Shared application context.

use std::sync::Arc;

use vl_core::config::Config;
use vl_core::events::EventBus;
use vl_db::pool::DbPool;
use vl_db::SqliteJobStore;
use vl_pipeline::{EncodingEngine, ProcessorOptions, VideoProcessor};

use crate::storage::LocalDiskStore;

/// Everything a command needs to run jobs: the database, the configuration,
/// the event bus, the blob store and the encoding engine.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub event_bus: Arc<EventBus>,
    pub blobs: Arc<LocalDiskStore>,
    pub engine: Arc<dyn EncodingEngine>,
}

impl AppContext {
    pub fn new(db: DbPool, config: Config, engine: Arc<dyn EncodingEngine>) -> Self {
        let blobs = Arc::new(LocalDiskStore::from_config(&config.storage));
        Self {
            db,
            config: Arc::new(config),
            event_bus: Arc::new(EventBus::default()),
            blobs,
            engine,
        }
    }

    /// Build a processor wired to this context's collaborators.
    pub fn processor(&self) -> VideoProcessor {
        VideoProcessor::new(
            Arc::new(SqliteJobStore::new(self.db.clone())),
            self.blobs.clone(),
            self.engine.clone(),
            self.event_bus.clone(),
            ProcessorOptions::from_config(&self.config),
        )
    }
}
