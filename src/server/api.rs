use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_auth::AuthBearer;
use axum_typed_multipart::TypedMultipart;
use log::info;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::ingest::IngestionPipeline;
use crate::search::{SearchRequest, SearchService, SearchTarget};
use crate::types::{ImageSource, IngestionReport, Pixels, SearchResults};

const DEFAULT_LIMIT: usize = 5;
const DEFAULT_UPLOAD_NAME: &str = "query.png";

/// Last component of the client-supplied file name, it is later joined onto the folder
fn upload_name(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string())
}

fn authorize(state: &AppState, token: &str) -> Result<()> {
    if token != state.token {
        return Err(AppError::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!("invalid token")));
    }
    Ok(())
}

/// Search faces similar to the uploaded image
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "ranked hits, or `no_face_detected`"),
        (status = 404, description = "unknown collection or folder"),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    data: TypedMultipart<SearchUpload>,
) -> Result<Json<SearchResults>> {
    authorize(&state, &token)?;

    let target = match (&data.collection, &data.folder) {
        (Some(collection), _) => SearchTarget::Collection(collection.clone()),
        (None, Some(folder)) => SearchTarget::Folder(folder.clone()),
        (None, None) => {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                anyhow::anyhow!("either collection or folder is required"),
            ));
        }
    };
    let pixels = Pixels::decode(&data.file.contents)
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, e))?;
    let store_query_as = data
        .store_query
        .unwrap_or(false)
        .then(|| upload_name(data.file.metadata.file_name.as_deref()));

    info!("searching uploaded image ({}x{})", pixels.width, pixels.height);
    let request = SearchRequest {
        target,
        image: ImageSource::Pixels(pixels),
        limit: data.limit.unwrap_or(DEFAULT_LIMIT),
        store_query_as,
    };
    let store = state.store.read().await;
    let results = SearchService::new(&state.embedder, &state.index).search(&store, request).await?;
    Ok(Json(results))
}

/// Ingest a folder into a collection
#[utoipa::path(
    post,
    path = "/ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "ingestion report"),
        (status = 404, description = "folder not found"),
        (status = 422, description = "no embeddings generated"),
    )
)]
pub async fn ingest_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    Json(data): Json<IngestRequest>,
) -> Result<Json<IngestionReport>> {
    authorize(&state, &token)?;

    info!("ingesting {}", data.folder.display());
    let mut store = state.store.write().await;
    let report = IngestionPipeline::new(&state.embedder, &state.index)
        .with_policy(data.policy)
        .ingest(&mut store, &data.folder)
        .await?;
    Ok(Json(report))
}

/// List folder => collection bindings
#[utoipa::path(get, path = "/collections")]
pub async fn collections_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<BTreeMap<String, String>>> {
    authorize(&state, &token)?;

    let store = state.store.read().await;
    let mapping =
        store.collections().map(|(folder, collection)| (folder.to_string(), collection.to_string()));
    Ok(Json(mapping.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_name_stays_in_folder() {
        assert_eq!(upload_name(Some("face.jpg")), "face.jpg");
        assert_eq!(upload_name(Some("../../etc/x.jpg")), "x.jpg");
        assert_eq!(upload_name(Some("/abs/dir/y.png")), "y.png");
        assert_eq!(upload_name(Some("..")), DEFAULT_UPLOAD_NAME);
        assert_eq!(upload_name(Some("")), DEFAULT_UPLOAD_NAME);
        assert_eq!(upload_name(None), DEFAULT_UPLOAD_NAME);
    }
}
