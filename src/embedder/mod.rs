mod http;

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

pub use self::http::HttpFaceEmbedder;
use crate::types::{Embedding, ImageSource};

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pixel buffer does not match a {width}x{height} RGB image")]
    PixelBuffer { width: u32, height: u32 },
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("embedding service rejected the image: {0}")]
    Rejected(String),
    #[error("embedding has {got} dimensions, expected {expected}")]
    Dimension { expected: usize, got: usize },
}

/// Detects faces in an image and computes one embedding per face.
///
/// An image without a face is not an error, it yields an empty vector.
pub trait FaceEmbeddingProvider: Send + Sync {
    fn detect_and_embed(
        &self,
        image: &ImageSource,
    ) -> impl Future<Output = Result<Vec<Embedding>, EmbedError>> + Send;
}
