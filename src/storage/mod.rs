pub mod backend;
pub mod local;
pub mod remote;
#[cfg(feature = "s3")]
pub mod s3;

pub use backend::StorageBackend;
pub use local::LocalStorage;
pub use remote::{EntryKind, ObjectEntry, ObjectStore, RemoteStorage};

use crate::config::{Config, StorageType};
use std::sync::Arc;

/// Factory function to create the appropriate storage backend
pub fn create_storage(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match config.storage_type {
        StorageType::Local => Ok(Arc::new(LocalStorage::new(config.uploads_root.clone()))),
        StorageType::S3 => {
            #[cfg(feature = "s3")]
            {
                let staging = Arc::new(LocalStorage::new(config.staging_dir()));
                let store = s3::S3ObjectStore::new(config)?;
                Ok(Arc::new(RemoteStorage::new(store, staging)))
            }
            #[cfg(not(feature = "s3"))]
            {
                Err(anyhow::anyhow!("S3 feature not enabled"))
            }
        }
    }
}
