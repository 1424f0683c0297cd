use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config_store::ConfigStore;
use crate::embedder::FaceEmbeddingProvider;
use crate::error::{Error, Result};
use crate::index::{ScoredPoint, VectorIndexService};
use crate::metrics;
use crate::types::{
    EmbeddingRecord, HitLocation, ImageSource, SearchHit, SearchOutcome, SearchResults,
};

/// Upper bound of the number of hits per query
pub const MAX_LIMIT: usize = 100;

/// Bring `limit` into `1..=MAX_LIMIT`
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// Which collection to search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    /// A collection identifier, used as is
    Collection(String),
    /// A folder, resolved through the mapping
    Folder(String),
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub target: SearchTarget,
    pub image: ImageSource,
    pub limit: usize,
    /// Also store the query face in the collection under this filename
    pub store_query_as: Option<String>,
}

/// Collection to query and the folder bound to it, if any
pub fn resolve_target<'s>(
    store: &'s ConfigStore,
    target: &SearchTarget,
) -> Result<(String, Option<&'s str>)> {
    match target {
        SearchTarget::Collection(collection) if !collection.is_empty() => {
            Ok((collection.clone(), store.folder_for(collection)))
        }
        SearchTarget::Folder(folder) => {
            let key = std::fs::canonicalize(folder)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| folder.clone());
            let collection = store
                .get_collection_for(&key)
                .ok_or_else(|| Error::UnknownCollection(folder.clone()))?;
            Ok((collection.to_string(), store.folder_for(collection)))
        }
        SearchTarget::Collection(collection) => Err(Error::UnknownCollection(collection.clone())),
    }
}

/// Query image => embedding => nearest neighbors => paths on disk
pub struct SearchService<'a, E, V> {
    embedder: &'a E,
    index: &'a V,
}

impl<'a, E, V> SearchService<'a, E, V>
where
    E: FaceEmbeddingProvider,
    V: VectorIndexService,
{
    pub fn new(embedder: &'a E, index: &'a V) -> Self {
        Self { embedder, index }
    }

    pub async fn search(&self, store: &ConfigStore, request: SearchRequest) -> Result<SearchResults> {
        let start = Instant::now();
        let limit = clamp_limit(request.limit);
        if limit != request.limit {
            debug!("limit {} clamped to {}", request.limit, limit);
        }

        let (collection_id, folder) = resolve_target(store, &request.target)?;

        let faces =
            self.embedder.detect_and_embed(&request.image).await.map_err(Error::QueryEmbedding)?;
        // only the first detected face is used
        let Some(query) = faces.into_iter().next() else {
            info!("no face detected in {}", request.image.describe());
            metrics::inc_search("no_face", start.elapsed().as_secs_f32());
            return Ok(SearchResults {
                collection_id,
                outcome: SearchOutcome::NoFaceDetected,
                query_store_error: None,
            });
        };

        let mut query_store_error = None;
        if let Some(name) = request.store_query_as {
            let record = EmbeddingRecord::new(query.clone(), name);
            if let Err(e) = self.index.upsert(&collection_id, &record).await {
                warn!("failed to store query face into {collection_id}: {e}");
                query_store_error = Some(e.to_string());
            }
        }

        let points = self
            .index
            .search(&collection_id, &query, limit)
            .await
            .map_err(|source| Error::Search { collection: collection_id.clone(), source })?;

        let hits = hydrate(points, folder);
        metrics::inc_search(
            if hits.is_empty() { "empty" } else { "matched" },
            start.elapsed().as_secs_f32(),
        );
        info!("{} hit(s) in {} ({:.2}s)", hits.len(), collection_id, start.elapsed().as_secs_f32());

        Ok(SearchResults { collection_id, outcome: SearchOutcome::Matches(hits), query_store_error })
    }
}

/// Turn raw neighbors into ranked hits with a location on disk
pub fn hydrate(points: Vec<ScoredPoint>, folder: Option<&str>) -> Vec<SearchHit> {
    points
        .into_iter()
        .enumerate()
        .map(|(i, point)| {
            let location = match folder {
                Some(folder) => {
                    let path = Path::new(folder).join(&point.payload.source_image);
                    if path.exists() {
                        HitLocation::Resolved(path)
                    } else {
                        debug!("image not found: {}", path.display());
                        HitLocation::Missing(path)
                    }
                }
                None => HitLocation::Unmapped,
            };
            SearchHit {
                rank: i + 1,
                source_image: point.payload.source_image,
                score: point.score,
                location,
            }
        })
        .collect()
}
