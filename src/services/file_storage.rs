/// Upload storage - media files on local disk, served under `/uploads/*`
use axum::body::Bytes;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// URL prefix every stored media path starts with.
pub const PUBLIC_PREFIX: &str = "uploads";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    UnsupportedFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Picture,
}

impl MediaKind {
    pub fn subdirectory(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audios",
            MediaKind::Picture => "pictures",
        }
    }

    fn accepts(&self, extension: &str) -> bool {
        match self {
            MediaKind::Audio => matches!(extension, "mp3" | "wav" | "ogg" | "flac" | "m4a" | "aac"),
            MediaKind::Picture => matches!(extension, "png" | "jpg" | "jpeg" | "gif" | "webp"),
        }
    }

    fn extension_for_mime(&self, content_type: &str) -> Option<&'static str> {
        match (self, content_type) {
            (MediaKind::Audio, "audio/mpeg") => Some("mp3"),
            (MediaKind::Audio, "audio/wav") | (MediaKind::Audio, "audio/x-wav") => Some("wav"),
            (MediaKind::Audio, "audio/ogg") => Some("ogg"),
            (MediaKind::Audio, "audio/flac") => Some("flac"),
            (MediaKind::Picture, "image/png") => Some("png"),
            (MediaKind::Picture, "image/jpeg") | (MediaKind::Picture, "image/jpg") => Some("jpg"),
            (MediaKind::Picture, "image/gif") => Some("gif"),
            (MediaKind::Picture, "image/webp") => Some("webp"),
            _ => None,
        }
    }
}

/// One file part of a multipart request, held in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Files written while handling one request.
///
/// Dropping the guard without [`StagedUpload::commit`] unlinks every file it
/// tracks, so any error after the write leaves no orphaned media behind.
#[derive(Debug, Default)]
pub struct StagedUpload {
    files: Vec<PathBuf>,
}

impl StagedUpload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Keep the files: the records referencing them were persisted.
    pub fn commit(mut self) {
        self.files.clear();
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        for path in self.files.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed unpersisted upload {}", path.display()),
                Err(e) => tracing::warn!("Could not remove unpersisted upload {}: {}", path.display(), e),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the media subdirectories
    pub async fn initialize(&self) -> Result<(), StorageError> {
        for kind in [MediaKind::Audio, MediaKind::Picture] {
            fs::create_dir_all(self.directory(kind)).await?;
        }
        Ok(())
    }

    pub fn directory(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.subdirectory())
    }

    /// Write an uploaded file and return its public path
    /// (`uploads/<kind>/<uuid>.<ext>`). The file is tracked by `staged`.
    pub async fn store(
        &self,
        staged: &mut StagedUpload,
        kind: MediaKind,
        file_name: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if data.is_empty() {
            return Err(StorageError::UnsupportedFile("Uploaded file is empty".to_string()));
        }

        let extension = Self::extension(kind, file_name, content_type)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.directory(kind).join(&file_name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        staged.files.push(path);

        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, kind.subdirectory(), file_name))
    }

    pub async fn store_upload(
        &self,
        staged: &mut StagedUpload,
        kind: MediaKind,
        upload: &UploadedFile,
    ) -> Result<String, StorageError> {
        self.store(
            staged,
            kind,
            upload.file_name.as_deref(),
            upload.content_type.as_deref(),
            &upload.data,
        )
        .await
    }

    /// Best-effort removal of a stored media file. Failures are logged only.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!("Refusing to remove media outside upload dir: {}", public_path);
            return;
        };

        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!("Could not remove media file {}: {}", path.display(), e);
        }
    }

    /// Map a public path back onto the upload directory
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = Path::new(public_path).strip_prefix(PUBLIC_PREFIX).ok()?;
        if relative.as_os_str().is_empty()
            || !relative.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    fn extension(
        kind: MediaKind,
        file_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let from_name = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let extension = match from_name {
            Some(ext) => Some(ext),
            None => content_type
                .and_then(|mime| kind.extension_for_mime(mime))
                .map(str::to_string),
        };

        match extension {
            Some(ext) if kind.accepts(&ext) => Ok(ext),
            Some(ext) => Err(StorageError::UnsupportedFile(format!(
                "Unsupported {} file type: .{}",
                kind.subdirectory(),
                ext
            ))),
            None => Err(StorageError::UnsupportedFile(format!(
                "Could not determine {} file type",
                kind.subdirectory()
            ))),
        }
    }
}
