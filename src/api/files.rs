use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};

use crate::auth::extractors::{AppState, AuthenticatedUser, OptionalUser};
use crate::models::{FileFilter, FileListing};
use crate::services::{FileError, PathError};
use tracing::debug;

pub fn create_router() -> Router<AppState> {
    // `{id}/download` and `{department}/{*tail}` share a prefix, so one
    // route serves both and dispatches on the shape of the path.
    Router::new()
        .route("/", get(list_files))
        .route("/{segment}/{*rest}", get(download))
}

async fn list_files(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(filter): Query<FileFilter>,
) -> Result<Json<Vec<FileListing>>, FileError> {
    let requester = auth_user.requester();
    let files = app_state.file_service.list(&filter, Some(&requester)).await?;
    Ok(Json(files))
}

async fn download(
    State(app_state): State<AppState>,
    user: OptionalUser,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Response {
    // Segments that do not decode to UTF-8 are just another unusable path.
    let (segment, rest) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => {
            debug!("Rejected file path: {}", rejection.body_text());
            return FileError::InvalidPath(PathError::Encoding).into_response();
        }
    };

    let result = match download_id(&segment, &rest) {
        Some(id) => match user.requester() {
            Some(requester) => app_state.file_service.download_by_id(id, &requester).await,
            None => Err(FileError::Unauthenticated),
        },
        None => {
            let requester = user.requester();
            app_state
                .file_service
                .download_by_path(&segment, &rest, requester.as_ref())
                .await
        }
    };

    match result {
        Ok(download) => download.into_response(),
        Err(e) => e.into_response(),
    }
}

/// `<integer>/download` addresses a record by id; anything else is a
/// department path.
fn download_id(segment: &str, rest: &str) -> Option<i64> {
    if rest == "download" {
        segment.parse().ok()
    } else {
        None
    }
}
