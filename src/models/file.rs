use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;

/// Visibility tier of a stored file. This is the only field that takes part
/// in the download decision.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Personal,
    Department,
    Public,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Personal => write!(f, "personal"),
            AccessLevel::Department => write!(f, "department"),
            AccessLevel::Public => write!(f, "public"),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(AccessLevel::Personal),
            "department" => Ok(AccessLevel::Department),
            "public" => Ok(AccessLevel::Public),
            other => Err(anyhow::anyhow!("Unknown access level: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub owner_id: i64,
    /// Department of the owning user, joined in at load time.
    pub owner_department_id: Option<i64>,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub access_level: AccessLevel,
    pub project_id: Option<i64>,
    /// Relative to the storage root, `files/<departmentCode>/<filename>`.
    pub path: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub owner_id: Option<i64>,
    /// Matches on the owner's department.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub department_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub project_id: Option<i64>,
}

/// `?ownerId=` is the same as leaving the filter out.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: i64,
    pub full_name: String,
    pub job_title: Option<String>,
    pub department_id: Option<i64>,
    pub department: Option<DepartmentSummary>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// A file record joined with the owner, owner department and project rows,
/// as the listing shows it.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub file: FileRecord,
    pub owner: OwnerSummary,
    pub project: Option<ProjectSummary>,
}

/// Flat row shape of the listing query. Left-joined columns are `None` when
/// the owner has no department or the file no project.
#[derive(Debug, Clone, FromRow)]
pub struct FileEntryRow {
    #[sqlx(flatten)]
    pub file: FileRecord,
    pub owner_full_name: String,
    pub owner_job_title: Option<String>,
    pub owner_department_name: Option<String>,
    pub owner_department_code: Option<String>,
    pub project_name: Option<String>,
    pub project_code: Option<String>,
}

impl From<FileEntryRow> for FileEntry {
    fn from(row: FileEntryRow) -> Self {
        let department = match (row.owner_department_name, row.owner_department_code) {
            (Some(name), Some(code)) => Some(DepartmentSummary { name, code }),
            _ => None,
        };
        let project = match (row.file.project_id, row.project_name, row.project_code) {
            (Some(id), Some(name), Some(code)) => Some(ProjectSummary { id, name, code }),
            _ => None,
        };
        let owner = OwnerSummary {
            id: row.file.owner_id,
            full_name: row.owner_full_name,
            job_title: row.owner_job_title,
            department_id: row.file.owner_department_id,
            department,
        };

        FileEntry { file: row.file, owner, project }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    #[serde(flatten)]
    pub file: FileRecord,
    pub owner: OwnerSummary,
    pub project: Option<ProjectSummary>,
    pub can_download: bool,
}
