use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{Distance, IndexError, ScoredPoint, VectorIndexService};
use crate::config_store::DeploymentSettings;
use crate::types::{EmbeddingRecord, Payload};

/// Qdrant over its REST API
#[derive(Debug, Clone)]
pub struct QdrantIndex {
    base_url: String,
    http: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<RawPoint>,
}

#[derive(Deserialize)]
struct RawPoint {
    id: serde_json::Value,
    score: f32,
    payload: Option<Payload>,
}

impl QdrantIndex {
    pub fn new(settings: &DeploymentSettings) -> Result<Self, IndexError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut value =
                HeaderValue::from_str(key).map_err(|_| IndexError::InvalidCredential)?;
            value.set_sensitive(true);
            headers.insert("api-key", value);
        }
        let http =
            Client::builder().default_headers(headers).timeout(Duration::from_secs(30)).build()?;
        Ok(Self { base_url: settings.url.trim_end_matches('/').to_string(), http })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}", self.base_url, collection)
    }
}

async fn check(resp: Response) -> Result<Response, IndexError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IndexError::Status { status: status.as_u16(), body })
}

impl VectorIndexService for QdrantIndex {
    async fn create_collection(
        &self,
        collection: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), IndexError> {
        let resp = self
            .http
            .put(self.collection_url(collection))
            .json(&json!({ "vectors": { "size": dimension, "distance": distance } }))
            .send()
            .await?;
        match check(resp).await {
            Ok(_) => {
                debug!("created collection {collection} ({dimension}, {distance:?})");
                Ok(())
            }
            Err(IndexError::Status { status, body }) if is_conflict(status, &body) => {
                Err(IndexError::AlreadyExists(collection.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn upsert(&self, collection: &str, record: &EmbeddingRecord) -> Result<(), IndexError> {
        let resp = self
            .http
            .put(format!("{}/points", self.collection_url(collection)))
            .query(&[("wait", "true")])
            .json(&json!({ "points": [record] }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let resp = self
            .http
            .post(format!("{}/points/search", self.collection_url(collection)))
            .json(&json!({ "vector": vector, "limit": limit, "with_payload": true }))
            .send()
            .await?;
        let parsed: SearchResponse = check(resp).await?.json().await?;

        Ok(parsed
            .result
            .into_iter()
            .filter_map(|point| match point.payload {
                Some(payload) => Some(ScoredPoint { score: point.score, payload }),
                None => {
                    warn!("point {} in {collection} has no image payload", point.id);
                    None
                }
            })
            .collect())
    }
}

/// Qdrant answers 409, or 400 "Wrong input" on older versions
fn is_conflict(status: u16, body: &str) -> bool {
    status == StatusCode::CONFLICT.as_u16()
        || (status == StatusCode::BAD_REQUEST.as_u16() && body.contains("already exists"))
}
