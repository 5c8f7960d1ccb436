use super::backend::StorageBackend;
use super::local::LocalStorage;
use crate::error::{MediaError, MediaResult};
use crate::path_scheme::{PathScheme, StoragePath};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub kind: EntryKind,
    /// Display name, e.g. `2024NOV` or `abc.png`
    pub name: String,
    /// Opaque backend path used for get/put/delete
    pub path: String,
}

/// Minimal object store with directory-like listing.
///
/// Names are not unique: a listing may return several directories with the
/// same display name.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the immediate children of `dir` (`""` is the root)
    async fn list(&self, dir: &str) -> Result<Vec<ObjectEntry>>;

    /// Create a directory marker under the root and return its opaque path
    async fn make_directory(&self, name: &str) -> Result<String>;

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// Storage backend over an [`ObjectStore`].
///
/// Display names are resolved to opaque paths by listing; the first match
/// wins for both directory markers and files. Writes go through a local
/// staging area before being transferred.
pub struct RemoteStorage<S> {
    store: S,
    staging: Arc<LocalStorage>,
}

fn unavailable(context: &str, e: anyhow::Error) -> MediaError {
    MediaError::StorageUnavailable(format!("{}: {}", context, e))
}

impl<S: ObjectStore> RemoteStorage<S> {
    pub fn new(store: S, staging: Arc<LocalStorage>) -> Self {
        RemoteStorage { store, staging }
    }

    async fn find_entry(
        &self,
        dir: &str,
        kind: EntryKind,
        name: &str,
    ) -> MediaResult<Option<ObjectEntry>> {
        let entries = self
            .store
            .list(dir)
            .await
            .map_err(|e| unavailable("Failed to list remote directory", e))?;

        let mut matches = entries
            .into_iter()
            .filter(|entry| entry.kind == kind && entry.name == name);
        let first = matches.next();

        let duplicates = matches.count();
        if duplicates > 0 {
            tracing::warn!(
                name = %name,
                duplicates,
                "Remote listing returned duplicate entries, using the first"
            );
        }
        Ok(first)
    }

    /// Opaque path of the container holding `path`, if it exists
    async fn find_container(&self, path: &StoragePath) -> MediaResult<Option<String>> {
        match &path.container {
            None => Ok(Some(String::new())),
            Some(container) => Ok(self
                .find_entry("", EntryKind::Directory, container)
                .await?
                .map(|entry| entry.path)),
        }
    }

    async fn find_file(&self, path: &StoragePath) -> MediaResult<Option<ObjectEntry>> {
        match self.find_container(path).await? {
            Some(dir) => self.find_entry(&dir, EntryKind::File, &path.file_name).await,
            None => Ok(None),
        }
    }

    /// Resolve the container, creating the marker if no listing entry
    /// matches. Check-then-create: concurrent callers may both create one.
    async fn resolve_or_create_container(&self, path: &StoragePath) -> MediaResult<String> {
        if let Some(dir) = self.find_container(path).await? {
            return Ok(dir);
        }

        let name = path.container.as_deref().unwrap_or_default();
        let created = self
            .store
            .make_directory(name)
            .await
            .map_err(|e| unavailable("Failed to create remote directory", e))?;
        tracing::info!(container = %name, "Created remote directory marker");
        Ok(created)
    }

    async fn transfer(&self, staged: &StoragePath, dir: &str) -> MediaResult<()> {
        let bytes = self.staging.read(staged).await?;
        let object_path = join_remote(dir, &staged.file_name);

        self.store
            .put(&object_path, bytes)
            .await
            .map_err(|e| unavailable("Failed to upload to remote storage", e))
    }
}

fn join_remote(dir: &str, file_name: &str) -> String {
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), file_name)
    }
}

#[async_trait]
impl<S: ObjectStore> StorageBackend for RemoteStorage<S> {
    fn path_scheme(&self) -> PathScheme {
        PathScheme::Remote
    }

    async fn ensure_container(&self, path: &StoragePath) -> MediaResult<()> {
        self.resolve_or_create_container(path).await.map(|_| ())
    }

    /// Expects `ensure_container` to have run; a missing marker is an error
    /// rather than a second create.
    async fn write(&self, path: &StoragePath, bytes: Vec<u8>) -> MediaResult<()> {
        let dir = self.find_container(path).await?.ok_or_else(|| {
            MediaError::StorageUnavailable(format!("Remote directory missing for {}", path))
        })?;

        let staged = StoragePath::root(path.file_name.clone());
        self.staging.ensure_container(&staged).await?;
        self.staging.write(&staged, bytes).await?;

        let transferred = self.transfer(&staged, &dir).await;

        if let Err(e) = self.staging.delete(&staged).await {
            tracing::warn!(path = %staged, "Failed to remove staged upload: {}", e);
        }

        transferred?;
        tracing::debug!(path = %path, "Transferred file to remote storage");
        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> MediaResult<Vec<u8>> {
        let entry = self
            .find_file(path)
            .await?
            .ok_or_else(|| MediaError::NotFound(path.key()))?;

        self.store
            .get(&entry.path)
            .await
            .map_err(|e| unavailable("Failed to download from remote storage", e))
    }

    async fn delete(&self, path: &StoragePath) -> MediaResult<()> {
        match self.find_file(path).await? {
            Some(entry) => self
                .store
                .delete(&entry.path)
                .await
                .map_err(|e| unavailable("Failed to delete from remote storage", e)),
            None => Ok(()),
        }
    }
}
