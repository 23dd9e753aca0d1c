/// Profile photo storage
///
/// Photos are stored under generated names; callers keep only the returned
/// public URL. The local implementation writes below a media root that the
/// HTTP layer serves statically.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Largest accepted upload (5 MiB)
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Accepted content types
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

const PHOTO_DIR: &str = "professionals/photos";

/// Error type for photo storage
#[derive(Debug, thiserror::Error)]
pub enum PhotoStorageError {
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Photo exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("Photo is empty")]
    Empty,

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks size and type before anything is written
pub fn check_upload(content_type: &str, len: usize) -> Result<(), PhotoStorageError> {
    let content_type = content_type.trim().to_ascii_lowercase();

    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(PhotoStorageError::UnsupportedType(content_type));
    }

    if len == 0 {
        return Err(PhotoStorageError::Empty);
    }

    if len > MAX_PHOTO_BYTES {
        return Err(PhotoStorageError::TooLarge { max: MAX_PHOTO_BYTES });
    }

    Ok(())
}

fn extension_for(content_type: &str) -> &'static str {
    if content_type.eq_ignore_ascii_case("image/png") {
        "png"
    } else {
        "jpg"
    }
}

/// Byte store for profile photos
#[async_trait]
pub trait PhotoStorage: Send + Sync + 'static {
    /// Stores the bytes and returns the public URL
    async fn save(&self, data: Bytes, content_type: &str) -> Result<String, PhotoStorageError>;

    /// Removes a previously stored photo; unknown URLs are ignored
    async fn delete(&self, url: &str) -> Result<(), PhotoStorageError>;
}

/// Filesystem storage below `root`, published under `base_url`
#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalPhotoStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a URL we issued back to its file; `None` for foreign URLs
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(&self.base_url)?.trim_start_matches('/');

        let file_name = relative.strip_prefix(PHOTO_DIR)?.trim_start_matches('/');
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return None;
        }

        Some(self.root.join(PHOTO_DIR).join(file_name))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn save(&self, data: Bytes, content_type: &str) -> Result<String, PhotoStorageError> {
        check_upload(content_type, data.len())?;

        let dir = self.root.join(PHOTO_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        tokio::fs::write(dir.join(&file_name), &data).await?;

        debug!(file_name = %file_name, bytes = data.len(), "Stored photo");

        Ok(format!("{}/{}/{}", self.base_url, PHOTO_DIR, file_name))
    }

    async fn delete(&self, url: &str) -> Result<(), PhotoStorageError> {
        let Some(path) = self.path_for(url) else {
            warn!(url, "Refusing to delete photo outside media root");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("holisticmatch-photos-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_check_upload() {
        assert!(check_upload("image/jpeg", 10).is_ok());
        assert!(check_upload("IMAGE/PNG", 10).is_ok());
        assert!(matches!(
            check_upload("image/gif", 10),
            Err(PhotoStorageError::UnsupportedType(_))
        ));
        assert!(matches!(check_upload("image/png", 0), Err(PhotoStorageError::Empty)));
        assert!(matches!(
            check_upload("image/png", MAX_PHOTO_BYTES + 1),
            Err(PhotoStorageError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let root = temp_root();
        let storage = LocalPhotoStorage::new(&root, "/media/");

        let url = storage
            .save(Bytes::from_static(b"\x89PNG fake"), "image/png")
            .await
            .unwrap();
        assert!(url.starts_with("/media/professionals/photos/"));
        assert!(url.ends_with(".png"));

        let path = storage.path_for(&url).unwrap();
        assert!(path.exists());

        storage.delete(&url).await.unwrap();
        assert!(!path.exists());

        // second delete is a no-op
        storage.delete(&url).await.unwrap();

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_foreign_urls_are_not_mapped() {
        let storage = LocalPhotoStorage::new("/srv/media", "/media");

        assert!(storage.path_for("https://cdn.example.com/x.png").is_none());
        assert!(storage.path_for("/media/professionals/photos/../../etc/passwd").is_none());
        assert!(storage.path_for("/media/other/x.png").is_none());
    }
}
