//! Application state containing the contact store and file catalog

use std::sync::Arc;

use crate::infrastructure::config::Config;
use crate::infrastructure::xml_store::XmlContactStore;
use crate::services::FileCatalog;

/// Application state shared across all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Canonical contact document
    pub store: Arc<XmlContactStore>,
    /// XML files in the storage directory
    pub catalog: Arc<FileCatalog>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create a new AppState rooted at the configured storage directory
    pub fn new(config: &Config) -> Self {
        let storage_dir = config.storage_dir();

        Self {
            store: Arc::new(XmlContactStore::new(&storage_dir)),
            catalog: Arc::new(FileCatalog::new(storage_dir)),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
