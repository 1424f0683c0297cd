mod add;
mod collections;
mod search;
pub mod server;
mod setup;

pub use add::*;
pub use collections::*;
pub use search::*;
pub use server::*;
pub use setup::*;

use anyhow::Context;
use clap::ValueEnum;

use crate::config::Opts;
use crate::config_store::ConfigStore;
use crate::embedder::HttpFaceEmbedder;
use crate::index::{EMBEDDING_DIM, QdrantIndex};

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Open the configuration and build clients for the configured deployment
pub(crate) fn connect(opts: &Opts) -> anyhow::Result<(ConfigStore, HttpFaceEmbedder, QdrantIndex)> {
    let store = ConfigStore::open(opts.conf_dir.config())?;
    let index = QdrantIndex::new(store.require_deployment()?)
        .context("failed to create vector database client")?;
    let embedder = HttpFaceEmbedder::new(opts.embedder.clone(), EMBEDDING_DIM)
        .context("failed to create embedding client")?;
    Ok((store, embedder, index))
}
