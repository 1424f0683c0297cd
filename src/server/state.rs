use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config_store::ConfigStore;
use crate::embedder::HttpFaceEmbedder;
use crate::index::QdrantIndex;

/// Shared application state
pub struct AppState {
    /// Face embedding client
    pub embedder: HttpFaceEmbedder,
    /// Vector database client
    pub index: QdrantIndex,
    /// Folder => collection mapping, ingestion holds the write lock for the whole run
    pub store: RwLock<ConfigStore>,
    /// Bearer token
    pub token: String,
}

impl AppState {
    pub fn new(
        store: ConfigStore,
        embedder: HttpFaceEmbedder,
        index: QdrantIndex,
        token: String,
    ) -> Arc<Self> {
        Arc::new(AppState { embedder, index, store: RwLock::new(store), token })
    }
}
