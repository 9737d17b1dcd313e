use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::storage::PathError;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found")]
    RecordNotFound,
    #[error("Missing file on disk")]
    MissingOnDisk,
    #[error("Access denied")]
    Forbidden,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for FileError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            FileError::RecordNotFound | FileError::InvalidPath(_) => {
                (StatusCode::NOT_FOUND, "File not found".to_string())
            }
            FileError::MissingOnDisk => (StatusCode::NOT_FOUND, "Missing file on disk".to_string()),
            FileError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions".to_string()),
            FileError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Missing or invalid authorization".to_string())
            }
            FileError::InvalidHeader(_) | FileError::Store(_) | FileError::Io(_) => {
                error!("File request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
