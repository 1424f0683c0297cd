use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// API error with the status code it maps to
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self { status, error: error.into() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": format!("{:#}", self.error) }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let status = match error.downcast_ref::<Error>() {
            Some(Error::FolderNotFound(_) | Error::UnknownCollection(_)) => StatusCode::NOT_FOUND,
            Some(
                Error::NoEmbeddings { .. } | Error::CollectionConflict(_) | Error::NotConfigured,
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(Error::InvalidSettings(_)) => StatusCode::BAD_REQUEST,
            Some(Error::QueryEmbedding(_) | Error::CollectionSetup { .. } | Error::Search { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
