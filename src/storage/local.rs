use super::backend::StorageBackend;
use crate::error::{MediaError, MediaResult};
use crate::path_scheme::{PathScheme, StoragePath};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Files on a mounted filesystem under `root`
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStorage { root: root.into() }
    }

    /// Join a storage path onto the root, refusing anything that could
    /// step outside it.
    fn to_fs_path(&self, path: &StoragePath) -> MediaResult<PathBuf> {
        let mut full = self.root.clone();

        if let Some(container) = &path.container {
            for segment in container.split('/') {
                push_segment(&mut full, segment, path)?;
            }
        }
        push_segment(&mut full, &path.file_name, path)?;

        if !full.starts_with(&self.root) {
            return Err(invalid_path(path));
        }
        Ok(full)
    }

    fn container_dir(&self, path: &StoragePath) -> MediaResult<PathBuf> {
        let file = self.to_fs_path(path)?;
        Ok(file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone()))
    }
}

fn push_segment(full: &mut PathBuf, segment: &str, path: &StoragePath) -> MediaResult<()> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if !segment.contains('\\') => {
            full.push(name);
            Ok(())
        }
        _ => Err(invalid_path(path)),
    }
}

fn invalid_path(path: &StoragePath) -> MediaError {
    tracing::error!(path = %path, "Resolved path escapes the uploads root");
    MediaError::InvalidPath(path.key())
}

fn unavailable(action: &str, path: &Path, e: std::io::Error) -> MediaError {
    MediaError::StorageUnavailable(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn path_scheme(&self) -> PathScheme {
        PathScheme::Local
    }

    async fn ensure_container(&self, path: &StoragePath) -> MediaResult<()> {
        let dir = self.container_dir(path)?;
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(unavailable("create directory", &dir, e)),
        }
    }

    async fn write(&self, path: &StoragePath, bytes: Vec<u8>) -> MediaResult<()> {
        let file_path = self.to_fs_path(path)?;
        let size = bytes.len();

        tokio::fs::write(&file_path, bytes)
            .await
            .map_err(|e| unavailable("write file", &file_path, e))?;

        tracing::debug!(path = %file_path.display(), size_bytes = size, "Stored file locally");
        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> MediaResult<Vec<u8>> {
        let file_path = self.to_fs_path(path)?;
        tokio::fs::read(&file_path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                MediaError::NotFound(path.key())
            } else {
                unavailable("read file", &file_path, e)
            }
        })
    }

    async fn delete(&self, path: &StoragePath) -> MediaResult<()> {
        let file_path = self.to_fs_path(path)?;
        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable("delete file", &file_path, e)),
        }
    }
}
