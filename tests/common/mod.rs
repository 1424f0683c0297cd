#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use facesearch::ConfigStore;
use facesearch::embedder::{EmbedError, FaceEmbeddingProvider};
use facesearch::index::{Distance, IndexError, ScoredPoint, VectorIndexService};
use facesearch::types::{Embedding, EmbeddingRecord, ImageSource};
use tempfile::TempDir;

/// Reads "images" as text: one comma separated vector per line is one face,
/// an empty file has no face and a leading `!` makes the provider fail.
#[derive(Debug, Default)]
pub struct FakeEmbedder;

impl FaceEmbeddingProvider for FakeEmbedder {
    async fn detect_and_embed(&self, image: &ImageSource) -> Result<Vec<Embedding>, EmbedError> {
        match image {
            ImageSource::Path(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|source| EmbedError::Read { path: path.clone(), source })?;
                if let Some(reason) = text.strip_prefix('!') {
                    return Err(EmbedError::Rejected(reason.trim().to_string()));
                }
                Ok(text.lines().filter(|l| !l.trim().is_empty()).map(parse_vector).collect())
            }
            ImageSource::Pixels(pixels) if pixels.data.is_empty() => Ok(vec![]),
            ImageSource::Pixels(pixels) => {
                Ok(vec![pixels.data.iter().map(|&b| b as f32).collect()])
            }
        }
    }
}

fn parse_vector(line: &str) -> Embedding {
    line.split(',').map(|v| v.trim().parse().unwrap()).collect()
}

/// In-memory index ranking by dot product
#[derive(Debug, Default)]
pub struct FakeIndex {
    collections: Mutex<HashMap<String, Vec<EmbeddingRecord>>>,
    /// Every create_collection call fails with HTTP 403
    pub deny_create: bool,
    /// Every collection already exists before the first create_collection
    pub preexisting: bool,
    /// Upserts of these filenames fail
    pub reject: HashSet<String>,
}

impl FakeIndex {
    pub fn rejecting(files: &[&str]) -> Self {
        Self { reject: files.iter().map(|f| f.to_string()).collect(), ..Default::default() }
    }

    pub fn denying() -> Self {
        Self { deny_create: true, ..Default::default() }
    }

    pub fn preexisting() -> Self {
        Self { preexisting: true, ..Default::default() }
    }

    pub fn records(&self, collection: &str) -> Vec<EmbeddingRecord> {
        self.collections.lock().unwrap().get(collection).cloned().unwrap_or_default()
    }

    pub fn collection_count(&self) -> usize {
        self.collections.lock().unwrap().len()
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.lock().unwrap().contains_key(collection)
    }
}

fn not_found(collection: &str) -> IndexError {
    IndexError::Status { status: 404, body: format!("collection {collection} not found") }
}

impl VectorIndexService for FakeIndex {
    async fn create_collection(
        &self,
        collection: &str,
        _dimension: usize,
        _distance: Distance,
    ) -> Result<(), IndexError> {
        if self.deny_create {
            return Err(IndexError::Status { status: 403, body: "forbidden".to_string() });
        }
        let mut collections = self.collections.lock().unwrap();
        if self.preexisting {
            collections.entry(collection.to_string()).or_default();
            return Err(IndexError::AlreadyExists(collection.to_string()));
        }
        if collections.contains_key(collection) {
            return Err(IndexError::AlreadyExists(collection.to_string()));
        }
        collections.insert(collection.to_string(), vec![]);
        Ok(())
    }

    async fn upsert(&self, collection: &str, record: &EmbeddingRecord) -> Result<(), IndexError> {
        if self.reject.contains(&record.payload.source_image) {
            return Err(IndexError::Status { status: 500, body: "disk full".to_string() });
        }
        let mut collections = self.collections.lock().unwrap();
        let records = collections.get_mut(collection).ok_or_else(|| not_found(collection))?;
        records.push(record.clone());
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let collections = self.collections.lock().unwrap();
        let records = collections.get(collection).ok_or_else(|| not_found(collection))?;
        let mut points = records
            .iter()
            .map(|r| ScoredPoint {
                score: r.vector.iter().zip(vector).map(|(a, b)| a * b).sum(),
                payload: r.payload.clone(),
            })
            .collect::<Vec<_>>();
        points.sort_by(|a, b| b.score.total_cmp(&a.score));
        points.truncate(limit);
        Ok(points)
    }
}

/// A temporary folder of fake images plus a configuration store
pub struct Workspace {
    pub dir: TempDir,
    /// Folder holding the images to ingest
    pub images: PathBuf,
    pub store: ConfigStore,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        let store = ConfigStore::open(dir.path().join("conf").join("config.json")).unwrap();
        Self { dir, images, store }
    }

    /// Canonical key of the image folder in the mapping
    pub fn images_key(&self) -> String {
        self.images.canonicalize().unwrap().to_string_lossy().into_owned()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        write_file(&self.images, name, content)
    }

    /// A query image outside the ingested folder
    pub fn query(&self, content: &str) -> PathBuf {
        write_file(self.dir.path(), "query.jpg", content)
    }

    pub fn reopen_store(&self) -> ConfigStore {
        ConfigStore::open(self.store.path()).unwrap()
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
