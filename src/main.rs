use anyhow::Result;
use axum::{http::HeaderValue, routing::get, Router};
use portal_files::{
    api,
    auth::{extractors::AppState, jwt::JwtService},
    repositories::{PgRecordStore, RecordStore},
    services::{file::FileService, storage::StorageRoot},
    AppConfig, Database,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_files=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::new()?;
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    info!("Starting portal file service on {}", bind_address);

    // Initialize database
    let database = match Database::connect(&config.database).await {
        Ok(db) => {
            info!("Database connected successfully");
            db
        }
        Err(e) => {
            error!("Failed to connect to database: {:#}", e);
            return Err(e);
        }
    };

    // Initialize JWT service
    let jwt_service = match JwtService::new(&config.auth) {
        Ok(service) => {
            info!("JWT service initialized successfully");
            service
        }
        Err(e) => {
            error!("Failed to initialize JWT service: {}", e);
            return Err(e);
        }
    };

    let storage = StorageRoot::new(&config.storage.root);
    if !tokio::fs::try_exists(storage.path()).await.unwrap_or(false) {
        warn!("Storage root {} does not exist yet", storage.path().display());
    }

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(database.clone()));
    let file_service = Arc::new(FileService::new(
        store.clone(),
        storage,
        config.storage.allow_unregistered,
    ));
    info!("File service initialized with storage root {}", config.storage.root);

    let app_state = AppState { store, file_service, jwt_service, config: config.clone() };

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing database pool");
    database.close().await;

    Ok(())
}

fn create_app(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.server.cors_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(api::create_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
}

async fn root_handler() -> &'static str {
    "Portal file service"
}

async fn health_handler(axum::extract::State(app_state): axum::extract::State<AppState>) -> &'static str {
    match app_state.store.health_check().await {
        Ok(_) => "OK",
        Err(_) => "Database connection failed",
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
