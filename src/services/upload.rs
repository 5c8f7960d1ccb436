use crate::error::{MediaError, MediaResult};
use crate::models::{IncomingFile, UploadRecord};
use crate::naming::{extension_from_filename, generate_slug, sanitize};
use crate::repository::UploadRepository;
use crate::storage::StorageBackend;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Stores incoming files and records their metadata
pub struct UploadService {
    storage: Arc<dyn StorageBackend>,
    repository: Arc<dyn UploadRepository>,
    site_name: String,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        repository: Arc<dyn UploadRepository>,
        site_name: impl Into<String>,
    ) -> Self {
        UploadService {
            storage,
            repository,
            site_name: site_name.into(),
        }
    }

    /// Store `file` and persist its record.
    ///
    /// Returns `NoFileProvided` when there is nothing to store. Bytes are
    /// written before the record is persisted, so a failed write never
    /// leaves a record behind.
    pub async fn upload(
        &self,
        file: Option<IncomingFile>,
        label: &str,
        description: Option<String>,
        owner_id: Uuid,
    ) -> MediaResult<UploadRecord> {
        let file = match file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => {
                tracing::debug!(owner_id = %owner_id, "Upload request carried no file");
                return Err(MediaError::NoFileProvided);
            }
        };

        let lowered = label.to_lowercase();
        let display_name = format!("{}-{}", sanitize(&lowered), self.site_name.to_lowercase());
        let extension = extension_from_filename(&file.original_filename);

        let now = Utc::now();
        let slug = generate_slug(&lowered, now);
        let path = self.storage.path_scheme().resolve(&slug, &extension, now);

        self.storage.ensure_container(&path).await?;
        self.storage.write(&path, file.bytes).await.map_err(|e| {
            tracing::error!(slug = %slug, path = %path, "Failed to store upload: {}", e);
            e
        })?;

        let record = UploadRecord {
            id: Uuid::new_v4(),
            owner_id,
            slug,
            original_name: label.to_string(),
            display_name,
            extension,
            size_bytes: i64::try_from(file.declared_size).unwrap_or(i64::MAX),
            description,
            created_at: now,
        };

        self.repository.create(&record).await.map_err(|e| {
            tracing::error!(
                slug = %record.slug,
                path = %path,
                "Stored file but failed to save record: {}",
                e
            );
            e
        })?;

        tracing::info!(
            slug = %record.slug,
            path = %path,
            size_bytes = record.size_bytes,
            "Upload stored"
        );

        Ok(record)
    }
}
