pub mod auth;
pub mod files;

use axum::{routing::get, Router};

use crate::auth::extractors::AppState;

pub fn create_router() -> Router<AppState> {
    let api = Router::new()
        .route("/status", get(status_handler))
        .nest("/auth", auth::create_router())
        .nest("/files", files::create_router());

    Router::new().nest("/api", api)
}

async fn status_handler() -> &'static str {
    "API is running"
}
