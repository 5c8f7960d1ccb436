use crate::error::{MediaError, MediaResult};
use crate::models::{Disposition, MediaResponse, UploadRecord};
use crate::naming::looks_like_slug;
use crate::path_scheme::StoragePath;
use crate::repository::UploadRepository;
use crate::storage::{LocalStorage, StorageBackend};
use std::sync::Arc;

/// Serves stored files by slug.
///
/// Unknown slugs and records whose bytes went missing both resolve to the
/// default asset instead of an error.
pub struct RetrievalService {
    storage: Arc<dyn StorageBackend>,
    repository: Arc<dyn UploadRepository>,
    fallback: Arc<LocalStorage>,
    default_asset: String,
}

impl RetrievalService {
    /// `fallback` is the local uploads root holding `default_asset`
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        repository: Arc<dyn UploadRepository>,
        fallback: Arc<LocalStorage>,
        default_asset: impl Into<String>,
    ) -> Self {
        RetrievalService {
            storage,
            repository,
            fallback,
            default_asset: default_asset.into(),
        }
    }

    pub async fn retrieve(&self, slug: &str, as_attachment: bool) -> MediaResult<MediaResponse> {
        let record = if looks_like_slug(slug) {
            self.repository.find_by_slug(slug).await?
        } else {
            None
        };

        let Some(record) = record else {
            tracing::debug!(slug = %slug, "Unknown media, serving default asset");
            return self.default_response(as_attachment).await;
        };

        let path = self
            .storage
            .path_scheme()
            .resolve(&record.slug, &record.extension, record.created_at);

        match self.storage.read(&path).await {
            Ok(bytes) => Ok(build_response(
                bytes,
                &path.file_name,
                suggested_name(&record),
                as_attachment,
            )),
            Err(MediaError::NotFound(_)) => {
                tracing::warn!(
                    slug = %record.slug,
                    path = %path,
                    "Record exists but file is missing, serving default asset"
                );
                self.default_response(as_attachment).await
            }
            Err(e) => Err(e),
        }
    }

    async fn default_response(&self, as_attachment: bool) -> MediaResult<MediaResponse> {
        let path = StoragePath::root(self.default_asset.clone());
        let bytes = self.fallback.read(&path).await.map_err(|e| {
            tracing::error!(path = %path, "Default asset unavailable: {}", e);
            match e {
                MediaError::NotFound(p) => {
                    MediaError::StorageUnavailable(format!("default asset missing: {}", p))
                }
                other => other,
            }
        })?;

        Ok(build_response(
            bytes,
            &self.default_asset,
            self.default_asset.clone(),
            as_attachment,
        ))
    }
}

/// Download name for a record. Sanitized labels may still carry control
/// whitespace (`\n`, `\t`), which cannot appear in a header value.
fn suggested_name(record: &UploadRecord) -> String {
    let display: String = record
        .display_name
        .chars()
        .map(|c| if c.is_ascii_whitespace() { '-' } else { c })
        .collect();
    if display.is_empty() {
        format!("{}.{}", record.slug, record.extension)
    } else {
        format!("{}.{}", display, record.extension)
    }
}

fn build_response(
    bytes: Vec<u8>,
    stored_name: &str,
    file_name: String,
    as_attachment: bool,
) -> MediaResponse {
    let mime_type = mime_guess::from_path(stored_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    if as_attachment {
        MediaResponse {
            content_length: Some(bytes.len() as u64),
            bytes,
            mime_type,
            file_name,
            disposition: Disposition::Attachment,
        }
    } else {
        MediaResponse {
            bytes,
            mime_type,
            file_name,
            disposition: Disposition::Inline,
            content_length: None,
        }
    }
}
