//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use obras_core::CatalogStore;

use crate::config::Config;
use crate::export::CsvExporter;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// The catalog. Lives as long as the process.
    pub store: Arc<CatalogStore>,
    /// Stages and streams CSV downloads.
    pub exporter: Arc<CsvExporter>,
}

impl AppState {
    pub fn new(config: Config, store: CatalogStore) -> Self {
        let exporter = CsvExporter::new(config.export_dir.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            exporter: Arc::new(exporter),
        }
    }
}
