//! In-memory doubles for the repository and object store

use crate::error::{MediaError, MediaResult};
use crate::models::UploadRecord;
use crate::path_scheme::{PathScheme, StoragePath};
use crate::repository::UploadRepository;
use crate::storage::{EntryKind, ObjectEntry, ObjectStore, StorageBackend};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryUploadRepository {
    records: Arc<Mutex<Vec<UploadRecord>>>,
}

impl MemoryUploadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn insert(&self, record: UploadRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl UploadRepository for MemoryUploadRepository {
    async fn create(&self, record: &UploadRecord) -> MediaResult<()> {
        self.insert(record.clone());
        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> MediaResult<Option<UploadRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.slug == slug)
            .cloned())
    }
}

#[derive(Default)]
struct MemoryObjects {
    /// (display name, opaque path) in creation order
    directories: Vec<(String, String)>,
    objects: BTreeMap<String, Vec<u8>>,
    next_id: usize,
    failing: bool,
    failing_puts: bool,
}

/// Object store that, like a drive-style API, hands out opaque directory ids
/// and allows several directories with the same name.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<MemoryObjects>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directory(&self, name: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let path = format!("dir-{}", inner.next_id);
        inner.directories.push((name.to_string(), path.clone()));
        path
    }

    pub fn directory_count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .directories
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }

    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.inner
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), bytes);
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().objects.get(path).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    pub fn set_failing_puts(&self, failing: bool) {
        self.inner.lock().unwrap().failing_puts = failing;
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.inner.lock().unwrap().failing {
            return Err(anyhow::anyhow!("object store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, dir: &str) -> anyhow::Result<Vec<ObjectEntry>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        let mut entries = Vec::new();

        if dir.is_empty() {
            for (name, path) in &inner.directories {
                entries.push(ObjectEntry {
                    kind: EntryKind::Directory,
                    name: name.clone(),
                    path: path.clone(),
                });
            }
        }

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        for path in inner.objects.keys() {
            if let Some(name) = path.strip_prefix(&prefix) {
                if !name.contains('/') {
                    entries.push(ObjectEntry {
                        kind: EntryKind::File,
                        name: name.to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        Ok(entries)
    }

    async fn make_directory(&self, name: &str) -> anyhow::Result<String> {
        self.check()?;
        Ok(self.add_directory(name))
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        self.check()?;
        if self.inner.lock().unwrap().failing_puts {
            return Err(anyhow::anyhow!("put rejected"));
        }
        self.insert(path, bytes);
        Ok(())
    }

    async fn get(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.check()?;
        self.object(path)
            .ok_or_else(|| anyhow::anyhow!("no such object: {}", path))
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        self.check()?;
        self.inner.lock().unwrap().objects.remove(path);
        Ok(())
    }
}

/// Backend whose writes always fail
pub struct UnavailableStorage;

#[async_trait]
impl StorageBackend for UnavailableStorage {
    fn path_scheme(&self) -> PathScheme {
        PathScheme::Local
    }

    async fn ensure_container(&self, _path: &StoragePath) -> MediaResult<()> {
        Ok(())
    }

    async fn write(&self, _path: &StoragePath, _bytes: Vec<u8>) -> MediaResult<()> {
        Err(MediaError::StorageUnavailable("disk full".to_string()))
    }

    async fn read(&self, path: &StoragePath) -> MediaResult<Vec<u8>> {
        Err(MediaError::NotFound(path.key()))
    }

    async fn delete(&self, _path: &StoragePath) -> MediaResult<()> {
        Ok(())
    }
}
