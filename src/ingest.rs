use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use indicatif::ProgressBar;
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::batch::EmbeddingBatchProcessor;
use crate::collection::CollectionLifecycleManager;
use crate::config_store::ConfigStore;
use crate::embedder::FaceEmbeddingProvider;
use crate::error::{Error, Result};
use crate::index::VectorIndexService;
use crate::metrics;
use crate::types::{CollectionStatus, EmbeddingRecord, FileError, IngestionReport};
use crate::utils::{collection_token, next_free_id};

/// What to do with a folder that is already bound to a collection
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReingestPolicy {
    /// Always create a new collection, the previous one stays in the index unbound
    #[default]
    Fresh,
    /// Append to the collection the folder is bound to
    Reuse,
}

/// Canonical identifier of a folder, fails if it does not exist
pub fn folder_id(folder: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(folder).map_err(|_| Error::FolderNotFound(folder.to_path_buf()))
}

/// Folder => embeddings => collection => mapping
pub struct IngestionPipeline<'a, E, V> {
    embedder: &'a E,
    index: &'a V,
    policy: ReingestPolicy,
    suffix: Option<Regex>,
    pb: ProgressBar,
}

impl<'a, E, V> IngestionPipeline<'a, E, V>
where
    E: FaceEmbeddingProvider,
    V: VectorIndexService,
{
    pub fn new(embedder: &'a E, index: &'a V) -> Self {
        Self {
            embedder,
            index,
            policy: ReingestPolicy::default(),
            suffix: None,
            pb: ProgressBar::hidden(),
        }
    }

    pub fn with_policy(mut self, policy: ReingestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_suffix(mut self, suffix: Regex) -> Self {
        self.suffix = Some(suffix);
        self
    }

    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    /// Ingest every image of `folder` and bind the folder to the collection.
    ///
    /// The mapping is only touched once the collection exists and holds at
    /// least one embedding attempt. Individual store failures are reported but
    /// do not prevent the binding.
    pub async fn ingest(&self, store: &mut ConfigStore, folder: &Path) -> Result<IngestionReport> {
        let folder = folder_id(folder)?;
        let folder_key = folder.to_string_lossy().into_owned();

        let mut processor = EmbeddingBatchProcessor::new(self.embedder).with_progress(self.pb.clone());
        if let Some(suffix) = &self.suffix {
            processor = processor.with_suffix(suffix.clone());
        }
        let batch = processor.process_folder(&folder).await?;

        let (collection_id, reusing) = match (self.policy, store.get_collection_for(&folder_key)) {
            (ReingestPolicy::Reuse, Some(existing)) => (existing.to_string(), true),
            _ => (next_free_id(collection_token(Local::now()), |id| store.is_bound(id)), false),
        };
        let collection_status =
            CollectionLifecycleManager::new(self.index).ensure_collection(&collection_id).await?;
        if collection_status == CollectionStatus::AlreadyExists && !reusing {
            return Err(Error::CollectionConflict(collection_id));
        }

        if batch.is_empty() {
            return Err(Error::NoEmbeddings { folder, failed: batch.stats.failed });
        }

        info!("storing {} embedding(s) into {}", batch.embeddings.len(), collection_id);
        let mut stored = 0;
        let mut store_failures = vec![];
        for (vector, filename) in batch.embeddings.into_iter().zip(batch.filenames) {
            let record = EmbeddingRecord::new(vector, filename);
            match self.index.upsert(&collection_id, &record).await {
                Ok(()) => {
                    stored += 1;
                    metrics::inc_store_record(true);
                }
                Err(e) => {
                    warn!("failed to store embedding for {}: {}", record.payload.source_image, e);
                    metrics::inc_store_record(false);
                    store_failures.push(FileError {
                        file: record.payload.source_image,
                        reason: e.to_string(),
                    });
                }
            }
        }

        store.set_collection_for(&folder_key, &collection_id)?;
        info!("{folder_key} is now bound to collection {collection_id}");

        Ok(IngestionReport {
            folder: folder_key,
            collection_id,
            collection_status,
            processed: batch.stats.processed,
            failed: batch.stats.failed,
            stored,
            store_errors: store_failures.len(),
            detection_failures: batch.errors,
            store_failures,
        })
    }
}
