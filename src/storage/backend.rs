use crate::error::MediaResult;
use crate::path_scheme::{PathScheme, StoragePath};
use async_trait::async_trait;

/// Trait defining the interface for storage backends
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Naming convention used to place files on this backend
    fn path_scheme(&self) -> PathScheme;

    /// Create the container for `path` if it is missing. Idempotent and safe
    /// to race with other callers.
    async fn ensure_container(&self, path: &StoragePath) -> MediaResult<()>;

    /// Store bytes at `path`
    async fn write(&self, path: &StoragePath, bytes: Vec<u8>) -> MediaResult<()>;

    /// Get file bytes at `path`, `NotFound` if absent
    async fn read(&self, path: &StoragePath) -> MediaResult<Vec<u8>>;

    /// Remove the file at `path`. Absent files are not an error.
    async fn delete(&self, path: &StoragePath) -> MediaResult<()>;
}
