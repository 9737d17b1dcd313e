use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::models::{FileFilter, FileListing, Requester};
use crate::repositories::RecordStore;
use crate::services::access::can_access;
use crate::services::errors::FileError;
use crate::services::storage::StorageRoot;

/// Content type used for files served without a record.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// An opened file plus the headers it will be sent with. The handle moves
/// into the response body stream and is dropped when the body finishes,
/// fails, or the client goes away.
#[derive(Debug)]
pub struct FileDownload {
    file: File,
    content_length: u64,
    content_type: HeaderValue,
    content_disposition: HeaderValue,
}

impl FileDownload {
    fn new(file: File, content_length: u64, name: &str, mime_type: &str) -> Result<Self, FileError> {
        let content_type = HeaderValue::from_str(&format!("{}; charset=utf-8", mime_type))
            .map_err(|_| FileError::InvalidHeader(format!("content type {:?}", mime_type)))?;
        let content_disposition = HeaderValue::from_str(&content_disposition(name))
            .map_err(|_| FileError::InvalidHeader(format!("file name {:?}", name)))?;

        Ok(Self { file, content_length, content_type, content_disposition })
    }

    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    pub fn content_disposition(&self) -> &HeaderValue {
        &self.content_disposition
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }
}

impl IntoResponse for FileDownload {
    fn into_response(self) -> Response {
        let stream = ReaderStream::new(self.file);

        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, self.content_type),
                (header::CONTENT_DISPOSITION, self.content_disposition),
                (header::CONTENT_LENGTH, HeaderValue::from(self.content_length)),
            ],
            Body::from_stream(stream),
        )
            .into_response()
    }
}

/// `attachment` disposition carrying both an ASCII fallback name and the
/// RFC 5987 UTF-8 form.
pub fn content_disposition(name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback_name(name),
        urlencoding::encode(name)
    )
}

/// Control characters and quotes dropped, anything outside printable ASCII
/// replaced by `_`.
pub fn ascii_fallback_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| !c.is_ascii_control() && *c != '"')
        .map(|c| if (' '..='~').contains(&c) { c } else { '_' })
        .collect();

    if safe.is_empty() {
        "file".to_string()
    } else {
        safe
    }
}

pub struct FileService {
    store: Arc<dyn RecordStore>,
    storage: StorageRoot,
    allow_unregistered: bool,
}

impl FileService {
    pub fn new(store: Arc<dyn RecordStore>, storage: StorageRoot, allow_unregistered: bool) -> Self {
        if allow_unregistered {
            warn!(
                "Unregistered files under {} are served without access checks",
                storage.path().display()
            );
        }

        Self { store, storage, allow_unregistered }
    }

    /// Every matching record, newest first, annotated with whether the
    /// requester may download it. Nothing is filtered out.
    pub async fn list(
        &self,
        filter: &FileFilter,
        requester: Option<&Requester>,
    ) -> Result<Vec<FileListing>, FileError> {
        let files = self.store.find_many(filter).await?;
        debug!("Listing {} files for filter {:?}", files.len(), filter);

        Ok(files
            .into_iter()
            .map(|entry| {
                let can_download = can_access(&entry.file, requester);
                FileListing { file: entry.file, owner: entry.owner, project: entry.project, can_download }
            })
            .collect())
    }

    pub async fn download_by_id(&self, id: i64, requester: &Requester) -> Result<FileDownload, FileError> {
        let file = self.store.find_by_id(id).await?.ok_or_else(|| {
            debug!("File record {} not found", id);
            FileError::RecordNotFound
        })?;

        if !can_access(&file, Some(requester)) {
            warn!("User {} denied download of file {}", requester.id, id);
            return Err(FileError::Forbidden);
        }

        let absolute = self.storage.resolve(&file.path).map_err(|e| {
            warn!("File {} has an unusable stored path: {}", id, e);
            FileError::MissingOnDisk
        })?;

        if !tokio::fs::try_exists(&absolute).await? {
            warn!("File {} is registered but missing at {}", id, absolute.display());
            return Err(FileError::MissingOnDisk);
        }

        let (handle, len) = self.open_stored(&absolute).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FileError::MissingOnDisk,
            _ => FileError::Io(e),
        })?;

        info!("Serving file {} to user {}", id, requester.id);
        FileDownload::new(handle, len, &file.name, &file.mime_type)
    }

    /// Deep-link download by `<department>/<tail>`. With a matching record the
    /// access check applies as for [`FileService::download_by_id`]; without one
    /// the file is served as-is when unregistered files are allowed.
    pub async fn download_by_path(
        &self,
        department: &str,
        tail: &str,
        requester: Option<&Requester>,
    ) -> Result<FileDownload, FileError> {
        let resolved = self.storage.resolve_department(department, tail).map_err(|e| {
            warn!("Rejected file path {}/{}: {}", department, tail, e);
            e
        })?;

        let record = self.store.find_by_exact_path(&resolved.lookup_key).await?;

        let (name, mime_type) = match &record {
            Some(file) => {
                if !can_access(file, requester) {
                    warn!(
                        "Requester {:?} denied download of file {}",
                        requester.map(|r| r.id),
                        file.id
                    );
                    return Err(FileError::Forbidden);
                }
                (file.name.as_str(), file.mime_type.as_str())
            }
            None if self.allow_unregistered => {
                debug!("No record for {}, serving unregistered file", resolved.lookup_key);
                (resolved.file_name.as_str(), FALLBACK_MIME)
            }
            None => {
                debug!("No record for {} and unregistered files are disabled", resolved.lookup_key);
                return Err(FileError::RecordNotFound);
            }
        };

        // Nothing has been sent yet, so any open failure is still a clean 404.
        let (handle, len) = match self.open_stored(&resolved.absolute).await {
            Ok(opened) => opened,
            Err(e) => {
                debug!("Could not open {}: {}", resolved.absolute.display(), e);
                return Err(FileError::MissingOnDisk);
            }
        };

        FileDownload::new(handle, len, name, mime_type)
    }

    /// Open `path` only if, with symlinks followed, it is still a regular file
    /// under the storage root. Anything else reads as not found.
    async fn open_stored(&self, path: &Path) -> std::io::Result<(File, u64)> {
        let target = self.storage.canonical_within(path).await?.ok_or_else(|| {
            warn!("{} resolves outside the storage root", path.display());
            std::io::Error::new(ErrorKind::NotFound, "outside the storage root")
        })?;

        open_regular_file(&target).await
    }
}

async fn open_regular_file(path: &Path) -> std::io::Result<(File, u64)> {
    let handle = File::open(path).await?;
    let metadata = handle.metadata().await?;

    if !metadata.is_file() {
        return Err(std::io::Error::new(ErrorKind::NotFound, "not a regular file"));
    }

    Ok((handle, metadata.len()))
}
