pub mod file_repository;
pub mod user_repository;
#[cfg(any(test, debug_assertions, feature = "test-utils"))]
pub mod test_record_store;

pub use file_repository::*;
pub use user_repository::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::database::Database;
use crate::models::{FileEntry, FileFilter, FileRecord, User};

/// Lookups the file service and the identity extractors need from the
/// relational store. The handle is created once at startup and shared.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>>;
    async fn find_by_exact_path(&self, path: &str) -> Result<Option<FileRecord>>;
    /// Ordered by `created_at` descending, joined with owner and project.
    async fn find_many(&self, filter: &FileFilter) -> Result<Vec<FileEntry>>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn health_check(&self) -> Result<()>;
}

/// Postgres-backed store.
pub struct PgRecordStore {
    database: Database,
    files: FileRepository,
    users: UserRepository,
}

impl PgRecordStore {
    pub fn new(database: Database) -> Self {
        let files = FileRepository::new(database.pool().clone());
        let users = UserRepository::new(database.pool().clone());
        Self { database, files, users }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        self.files.get_file(id).await
    }

    async fn find_by_exact_path(&self, path: &str) -> Result<Option<FileRecord>> {
        self.files.find_by_path(path).await
    }

    async fn find_many(&self, filter: &FileFilter) -> Result<Vec<FileEntry>> {
        self.files.list_files(filter).await
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.users.get_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn health_check(&self) -> Result<()> {
        self.database.health_check().await
    }
}
