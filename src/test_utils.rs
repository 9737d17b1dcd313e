use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::auth::{extractors::AppState, jwt::JwtService};
use crate::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig, StorageConfig};
use crate::repositories::RecordStore;
use crate::services::{file::FileService, storage::StorageRoot};

static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create an isolated in-memory SQLite database for testing
pub async fn create_test_database() -> Result<Pool<Sqlite>> {
    let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_name = format!("file:portal_test_db_{}?mode=memory&cache=shared", counter);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // SQLite in-memory works best with single connection
        .connect(&db_name)
        .await?;

    setup_test_schema(&pool).await?;

    Ok(pool)
}

async fn setup_test_schema(pool: &Pool<Sqlite>) -> Result<()> {
    // Mirrors migrations/ with SQLite types
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT UNIQUE NOT NULL,
            parent_department_id INTEGER REFERENCES departments(id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            full_name TEXT NOT NULL,
            job_title TEXT,
            department_id INTEGER REFERENCES departments(id),
            password_hash TEXT NOT NULL,
            global_role TEXT NOT NULL DEFAULT 'user',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT UNIQUE NOT NULL,
            department_id INTEGER REFERENCES departments(id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL REFERENCES users(id),
            project_id INTEGER REFERENCES projects(id),
            name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            access_level TEXT NOT NULL,
            path TEXT UNIQUE NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub fn test_config(storage_root: &Path, allow_unregistered: bool) -> AppConfig {
    AppConfig {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 3001, cors_origins: Vec::new() },
        database: DatabaseConfig { url: "sqlite::memory:".to_string(), max_connections: 1 },
        auth: AuthConfig {
            jwt_secret: "test-secret-key-for-jwt-authentication".to_string(),
            jwt_expires_in: "1h".to_string(),
        },
        storage: StorageConfig { root: storage_root.to_string_lossy().to_string(), allow_unregistered },
    }
}

/// Wire an `AppState` around any store, the way `main` does for Postgres.
pub fn create_test_app_state(store: Arc<dyn RecordStore>, config: AppConfig) -> Result<AppState> {
    let jwt_service = JwtService::new(&config.auth)?;
    let file_service = Arc::new(FileService::new(
        store.clone(),
        StorageRoot::new(&config.storage.root),
        config.storage.allow_unregistered,
    ));

    Ok(AppState { store, file_service, jwt_service, config })
}
