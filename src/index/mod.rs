mod qdrant;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::qdrant::QdrantIndex;
use crate::types::{EmbeddingRecord, Payload};

/// Width of every embedding stored by this deployment
pub const EMBEDDING_DIM: usize = 128;
/// Similarity metric of every collection
pub const DISTANCE: Distance = Distance::Dot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Euclid,
    Dot,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("collection {0} already exists")]
    AlreadyExists(String),
    #[error("API key contains characters not allowed in a header")]
    InvalidCredential,
    #[error("index request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("index service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// A nearest neighbor returned by the index, best first
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub score: f32,
    pub payload: Payload,
}

/// Remote vector index partitioned into named collections
pub trait VectorIndexService: Send + Sync {
    /// Fails with [`IndexError::AlreadyExists`] when `collection` is present
    fn create_collection(
        &self,
        collection: &str,
        dimension: usize,
        distance: Distance,
    ) -> impl Future<Output = Result<(), IndexError>> + Send;

    fn upsert(
        &self,
        collection: &str,
        record: &EmbeddingRecord,
    ) -> impl Future<Output = Result<(), IndexError>> + Send;

    /// At most `limit` neighbors of `vector`, most similar first
    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ScoredPoint>, IndexError>> + Send;
}
