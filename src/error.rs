use std::path::PathBuf;

use thiserror::Error;

use crate::embedder::EmbedError;
use crate::index::IndexError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that abort a whole operation.
///
/// Per-file and per-record failures never show up here, they are collected into
/// [`BatchResult`](crate::types::BatchResult) and
/// [`IngestionReport`](crate::types::IngestionReport) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("configuration storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("deployment is not configured, run `facesearch setup` first")]
    NotConfigured,

    #[error("invalid deployment settings: {0}")]
    InvalidSettings(String),

    #[error("failed to set up collection {collection}: {source}")]
    CollectionSetup {
        collection: String,
        #[source]
        source: IndexError,
    },

    #[error("collection {0} already exists, refusing to reuse it for a fresh ingestion")]
    CollectionConflict(String),

    #[error("no embeddings generated for {} ({failed} image(s) failed)", folder.display())]
    NoEmbeddings { folder: PathBuf, failed: usize },

    #[error("unknown collection reference: {0}")]
    UnknownCollection(String),

    #[error("failed to embed query image: {0}")]
    QueryEmbedding(#[source] EmbedError),

    #[error("search in collection {collection} failed: {source}")]
    Search {
        collection: String,
        #[source]
        source: IndexError,
    },
}
