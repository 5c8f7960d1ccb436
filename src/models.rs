use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted metadata for one stored file
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UploadRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Storage key, unique and never reused
    pub slug: String,
    /// Label as supplied by the caller, display only
    pub original_name: String,
    /// Sanitized label with the site discriminator appended
    pub display_name: String,
    pub extension: String,
    pub size_bytes: i64,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A file handed over by the request layer
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub bytes: Vec<u8>,
    pub original_filename: String,
    pub declared_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

/// Bytes plus the metadata needed to serve them
#[derive(Debug, Clone)]
pub struct MediaResponse {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub disposition: Disposition,
    /// Set for attachments only
    pub content_length: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub slug: String,
    pub url: String,
    pub download_url: String,
    pub display_name: String,
    pub extension: String,
    pub size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UploadResponse {
    pub fn from_record(record: UploadRecord) -> Self {
        UploadResponse {
            url: format!("/media/{}", record.slug),
            download_url: format!("/media/{}/download", record.slug),
            slug: record.slug,
            display_name: record.display_name,
            extension: record.extension,
            size_bytes: record.size_bytes,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub uuid: String,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
