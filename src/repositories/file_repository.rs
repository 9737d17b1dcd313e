use anyhow::Result;
use sqlx::PgPool;
use crate::models::{FileEntry, FileEntryRow, FileFilter, FileRecord};

const FILE_COLUMNS: &str = "f.id, f.owner_id, u.department_id AS owner_department_id, f.name, f.mime_type, \
     f.size_bytes, f.access_level, f.project_id, f.path, f.created_at";

/// Listing extras: owner name and title, owner department, project.
pub(crate) const ENTRY_COLUMNS: &str = "u.full_name AS owner_full_name, u.job_title AS owner_job_title, \
     d.name AS owner_department_name, d.code AS owner_department_code, \
     p.name AS project_name, p.code AS project_code";

pub(crate) const ENTRY_JOINS: &str = "FROM files f JOIN users u ON u.id = f.owner_id \
     LEFT JOIN departments d ON d.id = u.department_id \
     LEFT JOIN projects p ON p.id = f.project_id";

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_file(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f JOIN users u ON u.id = f.owner_id WHERE f.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Exact string match on the stored relative path, no normalization.
    pub async fn find_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f JOIN users u ON u.id = f.owner_id WHERE f.path = $1"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    pub async fn list_files(&self, filter: &FileFilter) -> Result<Vec<FileEntry>> {
        let rows = sqlx::query_as::<_, FileEntryRow>(&format!(
            "SELECT {FILE_COLUMNS}, {ENTRY_COLUMNS} {ENTRY_JOINS}
             WHERE ($1::BIGINT IS NULL OR f.owner_id = $1)
               AND ($2::BIGINT IS NULL OR u.department_id = $2)
               AND ($3::BIGINT IS NULL OR f.project_id = $3)
             ORDER BY f.created_at DESC, f.id DESC"
        ))
        .bind(filter.owner_id)
        .bind(filter.department_id)
        .bind(filter.project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FileEntry::from).collect())
    }
}
