use std::io::Cursor;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use super::{EmbedError, FaceEmbeddingProvider};
use crate::types::{Embedding, ImageSource, Pixels};

/// Client of a face embedding service.
///
/// The service receives the encoded image as the request body and answers
/// `{"embeddings": [[f32; N], ...]}`, one entry per detected face.
#[derive(Debug, Clone)]
pub struct HttpFaceEmbedder {
    url: String,
    dimension: usize,
    http: Client,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Embedding>,
}

impl HttpFaceEmbedder {
    pub fn new(url: impl Into<String>, dimension: usize) -> Result<Self, EmbedError> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { url: url.into(), dimension, http })
    }

    async fn image_bytes(image: &ImageSource) -> Result<Vec<u8>, EmbedError> {
        match image {
            ImageSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|source| EmbedError::Read { path: path.clone(), source }),
            ImageSource::Pixels(pixels) => encode_png(pixels),
        }
    }
}

impl FaceEmbeddingProvider for HttpFaceEmbedder {
    async fn detect_and_embed(&self, image: &ImageSource) -> Result<Vec<Embedding>, EmbedError> {
        let body = Self::image_bytes(image).await?;

        let resp = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Rejected(format!("HTTP {status}: {body}")));
        }

        let parsed: EmbedResponse = resp.json().await?;
        if let Some(bad) = parsed.embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(EmbedError::Dimension { expected: self.dimension, got: bad.len() });
        }
        debug!("{} face(s) in {}", parsed.embeddings.len(), image.describe());
        Ok(parsed.embeddings)
    }
}

fn encode_png(pixels: &Pixels) -> Result<Vec<u8>, EmbedError> {
    let img = image::RgbImage::from_raw(pixels.width, pixels.height, pixels.data.clone())
        .ok_or(EmbedError::PixelBuffer { width: pixels.width, height: pixels.height })?;
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn embedder(server: &MockServer, dimension: usize) -> HttpFaceEmbedder {
        HttpFaceEmbedder::new(format!("{}/embed", server.uri()), dimension).unwrap()
    }

    #[tokio::test]
    async fn test_returns_one_vector_per_face() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(header("content-type", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2], [0.3, 0.4]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"jpeg").unwrap();

        let faces =
            embedder(&server, 2).await.detect_and_embed(&ImageSource::Path(file)).await.unwrap();
        assert_eq!(faces, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_no_face_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": []
            })))
            .mount(&server)
            .await;

        let pixels = Pixels { width: 2, height: 1, data: vec![0; 6] };
        let faces =
            embedder(&server, 2).await.detect_and_embed(&ImageSource::Pixels(pixels)).await.unwrap();
        assert!(faces.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_width_and_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 2.0, 3.0]]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(400).set_body_string("cannot decode"))
            .mount(&server)
            .await;

        let pixels = ImageSource::Pixels(Pixels { width: 1, height: 1, data: vec![1, 2, 3] });
        let err = embedder(&server, 2).await.detect_and_embed(&pixels).await.unwrap_err();
        assert!(matches!(err, EmbedError::Dimension { expected: 2, got: 3 }));

        let broken = HttpFaceEmbedder::new(format!("{}/broken", server.uri()), 2).unwrap();
        let err = broken.detect_and_embed(&pixels).await.unwrap_err();
        assert!(matches!(err, EmbedError::Rejected(ref msg) if msg.contains("cannot decode")));
    }

    #[tokio::test]
    async fn test_unreadable_and_malformed_input() {
        let server = MockServer::start().await;
        let embedder = embedder(&server, 2).await;

        let err = embedder
            .detect_and_embed(&ImageSource::Path("/nonexistent/face.png".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Read { .. }));

        let short = ImageSource::Pixels(Pixels { width: 4, height: 4, data: vec![0; 3] });
        let err = embedder.detect_and_embed(&short).await.unwrap_err();
        assert!(matches!(err, EmbedError::PixelBuffer { width: 4, height: 4 }));
    }
}
