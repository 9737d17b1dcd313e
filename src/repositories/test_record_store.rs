use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::models::{FileEntry, FileEntryRow, FileFilter, FileRecord, User};
use crate::repositories::file_repository::{ENTRY_COLUMNS, ENTRY_JOINS};
use crate::repositories::RecordStore;

const FILE_COLUMNS: &str = "f.id, f.owner_id, u.department_id AS owner_department_id, f.name, f.mime_type, \
     f.size_bytes, f.access_level, f.project_id, f.path, f.created_at";

const USER_COLUMNS: &str =
    "id, email, full_name, job_title, department_id, password_hash, global_role, created_at";

/// SQLite-backed store used by the test suite.
pub struct TestRecordStore {
    pool: Pool<Sqlite>,
}

impl TestRecordStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create_department(&self, id: i64, name: &str, code: &str) -> Result<()> {
        sqlx::query("INSERT INTO departments (id, name, code) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn create_project(&self, id: i64, name: &str, code: &str, department_id: Option<i64>) -> Result<()> {
        sqlx::query("INSERT INTO projects (id, name, code, department_id) VALUES (?1, ?2, ?3, ?4)")
            .bind(id)
            .bind(name)
            .bind(code)
            .bind(department_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, job_title, department_id, password_hash, global_role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.job_title)
        .bind(user.department_id)
        .bind(&user.password_hash)
        .bind(user.global_role.to_string())
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// `owner_department_id` is derived from the owner row and ignored here.
    pub async fn create_file(&self, file: &FileRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (id, owner_id, project_id, name, mime_type, size_bytes, access_level, path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(file.id)
        .bind(file.owner_id)
        .bind(file.project_id)
        .bind(&file.name)
        .bind(&file.mime_type)
        .bind(file.size_bytes)
        .bind(file.access_level.to_string())
        .bind(&file.path)
        .bind(file.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn file_from_row(row: &SqliteRow) -> Result<FileRecord> {
        Ok(FileRecord {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            owner_department_id: row.try_get("owner_department_id")?,
            name: row.try_get("name")?,
            mime_type: row.try_get("mime_type")?,
            size_bytes: row.try_get("size_bytes")?,
            access_level: row.try_get::<String, _>("access_level")?.parse()?,
            project_id: row.try_get("project_id")?,
            path: row.try_get("path")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn entry_from_row(row: &SqliteRow) -> Result<FileEntry> {
        Ok(FileEntryRow {
            file: Self::file_from_row(row)?,
            owner_full_name: row.try_get("owner_full_name")?,
            owner_job_title: row.try_get("owner_job_title")?,
            owner_department_name: row.try_get("owner_department_name")?,
            owner_department_code: row.try_get("owner_department_code")?,
            project_name: row.try_get("project_name")?,
            project_code: row.try_get("project_code")?,
        }
        .into())
    }

    fn user_from_row(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            job_title: row.try_get("job_title")?,
            department_id: row.try_get("department_id")?,
            password_hash: row.try_get("password_hash")?,
            global_role: row.try_get::<String, _>("global_role")?.parse()?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RecordStore for TestRecordStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM files f JOIN users u ON u.id = f.owner_id WHERE f.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::file_from_row).transpose()
    }

    async fn find_by_exact_path(&self, path: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM files f JOIN users u ON u.id = f.owner_id WHERE f.path = ?1"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::file_from_row).transpose()
    }

    async fn find_many(&self, filter: &FileFilter) -> Result<Vec<FileEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS}, {ENTRY_COLUMNS} {ENTRY_JOINS}
             WHERE (?1 IS NULL OR f.owner_id = ?1)
               AND (?2 IS NULL OR u.department_id = ?2)
               AND (?3 IS NULL OR f.project_id = ?3)
             ORDER BY f.created_at DESC, f.id DESC"
        ))
        .bind(filter.owner_id)
        .bind(filter.department_id)
        .bind(filter.project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::entry_from_row).collect()
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
