use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A face embedding, one per detected face
pub type Embedding = Vec<f32>;

/// Image handed to the embedding provider, resolved once at the boundary
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk
    Path(PathBuf),
    /// Decoded RGB8 pixels, e.g. an uploaded query image
    Pixels(Pixels),
}

impl ImageSource {
    /// Human readable name used in logs
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Pixels(pixels) => format!("<{}x{} pixels>", pixels.width, pixels.height),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Row-major RGB8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Pixels {
    /// Decode an encoded image (png, jpeg) into RGB pixels
    pub fn decode(bytes: &[u8]) -> image::ImageResult<Self> {
        let img = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Self { width, height, data: img.into_raw() })
    }
}

/// Stored alongside every vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "image")]
    pub source_image: String,
}

/// A single point written to the vector index
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Embedding,
    pub payload: Payload,
}

impl EmbeddingRecord {
    /// Create a record with a freshly generated id
    pub fn new(vector: Embedding, source_image: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            payload: Payload { source_image: source_image.into() },
        }
    }
}

/// A recoverable failure of one file or one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Files that yielded at least one embedding
    pub processed: usize,
    /// Files that yielded none
    pub failed: usize,
}

/// Outcome of embedding every image of one folder.
///
/// `embeddings` and `filenames` are index-aligned; a filename repeats when an
/// image contains several faces.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub embeddings: Vec<Embedding>,
    pub filenames: Vec<String>,
    pub errors: Vec<FileError>,
    pub stats: BatchStats,
}

impl BatchResult {
    pub(crate) fn push_faces(&mut self, filename: &str, faces: Vec<Embedding>) {
        self.filenames.extend(std::iter::repeat_n(filename.to_owned(), faces.len()));
        self.embeddings.extend(faces);
        self.stats.processed += 1;
    }

    pub(crate) fn push_error(&mut self, filename: &str, reason: impl Into<String>) {
        self.errors.push(FileError { file: filename.to_owned(), reason: reason.into() });
        self.stats.failed += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

/// Summary of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub folder: String,
    pub collection_id: String,
    pub collection_status: CollectionStatus,
    /// Images with at least one face
    pub processed: usize,
    /// Images without a usable face
    pub failed: usize,
    /// Records written to the index
    pub stored: usize,
    /// Records the index refused
    pub store_errors: usize,
    pub detection_failures: Vec<FileError>,
    pub store_failures: Vec<FileError>,
}

/// Where a hit's source image lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum HitLocation {
    /// Joined path exists
    Resolved(PathBuf),
    /// Joined path does not exist anymore
    Missing(PathBuf),
    /// No folder is mapped to the collection
    Unmapped,
}

impl HitLocation {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Resolved(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// 1-based position in the ranking
    pub rank: usize,
    pub source_image: String,
    pub score: f32,
    pub location: HitLocation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "hits", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The query image has no detectable face, nothing was searched
    NoFaceDetected,
    /// Ranked hits, possibly empty
    Matches(Vec<SearchHit>),
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::NoFaceDetected => &[],
            Self::Matches(hits) => hits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub collection_id: String,
    pub outcome: SearchOutcome,
    /// Set when storing the query face was requested and failed
    pub query_store_error: Option<String>,
}
