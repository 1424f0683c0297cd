use std::path::PathBuf;

use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::ingest::ReingestPolicy;

/// Search upload
#[derive(TryFromMultipart)]
pub struct SearchUpload {
    pub file: FieldData<Bytes>,
    pub collection: Option<String>,
    pub folder: Option<String>,
    pub limit: Option<usize>,
    pub store_query: Option<bool>,
}

/// Search form (for the API docs)
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// Image containing the face to look for
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Collection to search, takes precedence over `folder`
    pub collection: Option<String>,
    /// Search the collection bound to this folder
    pub folder: Option<String>,
    /// Number of matches, clamped to 1..=100
    #[schema(default = 5)]
    pub limit: Option<usize>,
    /// Also store the query face in the collection
    #[schema(default = false)]
    pub store_query: Option<bool>,
}

/// Ingest a folder visible to the server
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    /// Folder path on the server
    #[schema(value_type = String)]
    pub folder: PathBuf,
    /// `fresh` or `reuse`
    #[serde(default)]
    #[schema(value_type = String, default = "fresh")]
    pub policy: ReingestPolicy,
}
