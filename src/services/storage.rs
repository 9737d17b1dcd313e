use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Prefix every stored file path carries under the storage root.
pub const FILES_PREFIX: &str = "files";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty path segment")]
    EmptySegment,
    #[error("Path traversal segment: {0}")]
    Traversal(String),
    #[error("Absolute path not allowed")]
    Absolute,
    #[error("Forbidden character in path")]
    ForbiddenCharacter,
    #[error("Path is not valid percent-encoded UTF-8")]
    Encoding,
}

/// A department-style request resolved against the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentPath {
    /// Exact key looked up against stored record paths.
    pub lookup_key: String,
    pub absolute: PathBuf,
    /// Last path segment, used when no record provides a display name.
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Join a stored relative path onto the root. The path must stay inside
    /// the root lexically; nothing on disk is touched here.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, PathError> {
        validate_relative(relative)?;

        let mut absolute = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => absolute.push(part),
                Component::ParentDir | Component::CurDir => {
                    return Err(PathError::Traversal(relative.to_string()))
                }
                Component::RootDir | Component::Prefix(_) => return Err(PathError::Absolute),
            }
        }

        Ok(absolute)
    }

    /// Resolve a `<department>/<tail>` pair. Both parts are percent-decoded
    /// again (the router has already decoded once) and validated before any
    /// lookup key is produced.
    pub fn resolve_department(&self, department: &str, tail: &str) -> Result<DepartmentPath, PathError> {
        let joined = format!("{}/{}", department, tail);
        let decoded = urlencoding::decode(&joined).map_err(|_| PathError::Encoding)?;

        let lookup_key = format!("{}/{}", FILES_PREFIX, decoded);
        let absolute = self.resolve(&lookup_key)?;
        let file_name = decoded.rsplit('/').next().unwrap_or_default().to_string();

        Ok(DepartmentPath { lookup_key, absolute, file_name })
    }

    /// Canonical form of `path` with every symlink followed, or `None` when
    /// that lands outside the canonical root. Fails if either does not exist.
    pub async fn canonical_within(&self, path: &Path) -> std::io::Result<Option<PathBuf>> {
        let root = tokio::fs::canonicalize(&self.root).await?;
        let target = tokio::fs::canonicalize(path).await?;

        Ok(target.starts_with(&root).then_some(target))
    }
}

/// Reject anything that could step outside the root: empty, `.` or `..`
/// segments, leading slashes, backslashes, NUL and drive prefixes.
pub fn validate_relative(path: &str) -> Result<(), PathError> {
    if path.starts_with('/') {
        return Err(PathError::Absolute);
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(PathError::ForbiddenCharacter);
    }

    for (index, segment) in path.split('/').enumerate() {
        match segment {
            "" => return Err(PathError::EmptySegment),
            "." | ".." => return Err(PathError::Traversal(path.to_string())),
            _ => {}
        }
        if index == 0 && has_drive_prefix(segment) {
            return Err(PathError::Absolute);
        }
    }

    Ok(())
}

fn has_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
