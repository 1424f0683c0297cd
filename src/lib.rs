pub mod batch;
pub mod cli;
pub mod collection;
pub mod config;
pub mod config_store;
pub mod embedder;
pub mod error;
pub mod index;
pub mod ingest;
mod metrics;
pub mod search;
mod server;
pub mod types;
pub mod utils;

pub use batch::EmbeddingBatchProcessor;
pub use collection::CollectionLifecycleManager;
pub use config::Opts;
pub use config_store::{Config, ConfigStore, DeploymentKind, DeploymentSettings};
pub use embedder::{EmbedError, FaceEmbeddingProvider, HttpFaceEmbedder};
pub use error::{Error, Result};
pub use index::{IndexError, QdrantIndex, VectorIndexService};
pub use ingest::{IngestionPipeline, ReingestPolicy};
pub use search::{SearchRequest, SearchService, SearchTarget};
