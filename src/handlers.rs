use crate::auth::AuthOwner;
use crate::config::Config;
use crate::error::MediaError;
use crate::models::{Disposition, IncomingFile, MediaResponse, UploadResponse};
use crate::services::{RetrievalService, UploadService};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::DecodingKey;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadService>,
    pub retrieval: Arc<RetrievalService>,
    pub public_key: Arc<DecodingKey>,
    pub config: Config,
}

fn bad_multipart(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_REQUEST,
        format!("Invalid multipart data: {}", e),
    )
        .into_response()
}

/// POST /upload - Upload a media file
///
/// Multipart fields: the file (field name from `UPLOAD_FIELD`), `name` and
/// `description`.
pub async fn upload_media(
    State(state): State<AppState>,
    AuthOwner(owner_id): AuthOwner,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), Response> {
    let max = state.config.max_upload_bytes;
    let mut file: Option<IncomingFile> = None;
    let mut label = String::new();
    let mut description: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        if name == state.config.upload_field {
            let original_filename = field.file_name().unwrap_or("").to_string();
            let data = field.bytes().await.map_err(bad_multipart)?;

            if data.len() > max {
                return Err(MediaError::FileTooLarge {
                    size: data.len(),
                    max,
                }
                .into_response());
            }

            file = Some(IncomingFile {
                declared_size: data.len() as u64,
                bytes: data.to_vec(),
                original_filename,
            });
            continue;
        }

        match name.as_str() {
            "name" => label = field.text().await.map_err(bad_multipart)?,
            "description" => {
                let text = field.text().await.map_err(bad_multipart)?;
                description = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let record = state
        .uploads
        .upload(file, &label, description, owner_id)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from_record(record))))
}

/// GET /media/:slug - Serve a file inline
pub async fn get_media(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, MediaError> {
    let media = state.retrieval.retrieve(&slug, false).await?;
    Ok(media_response(media))
}

/// GET /media/:slug/download - Serve a file as a download
pub async fn download_media(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, MediaError> {
    let media = state.retrieval.retrieve(&slug, true).await?;
    Ok(media_response(media))
}

/// Turn a retrieved file into an HTTP response
pub fn media_response(media: MediaResponse) -> Response {
    let content_type = HeaderValue::from_str(&media.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = Response::new(Body::from(media.bytes));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);

    if media.disposition == Disposition::Attachment {
        headers.insert(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&media.file_name),
        );
        if let Some(length) = media.content_length {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        }
    }

    response
}

/// `attachment; filename="..."`, always encodable. Characters a quoted
/// header value cannot carry are replaced with `-`.
fn attachment_disposition(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .filter(|c| !matches!(c, '"' | '\\'))
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '-' })
        .collect();

    if safe != file_name {
        tracing::error!(
            file_name = ?file_name,
            sent = %safe,
            "Download name is not a valid header value, sending a rewritten name"
        );
    }

    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::services::{RetrievalService, UploadService};
    use crate::storage::LocalStorage;
    use crate::test_support::MemoryUploadRepository;
    use axum::{body::to_bytes, http::Request, routing::get, Router};
    use tower::ServiceExt;

    const DEFAULT_BYTES: &[u8] = b"default image";

    fn app(dir: &std::path::Path) -> (Router, Arc<UploadService>) {
        std::fs::write(dir.join("default.jpg"), DEFAULT_BYTES).unwrap();
        let storage = Arc::new(LocalStorage::new(dir));
        let repo = Arc::new(MemoryUploadRepository::new());
        let uploads = Arc::new(UploadService::new(storage.clone(), repo.clone(), "acme"));
        let retrieval = Arc::new(RetrievalService::new(
            storage.clone(),
            repo,
            storage,
            "default.jpg",
        ));
        // Retrieval routes are public, the key is never consulted
        let state = AppState {
            uploads: uploads.clone(),
            retrieval,
            public_key: Arc::new(DecodingKey::from_secret(b"unused")),
            config: test_config(dir),
        };
        let router = Router::new()
            .route("/media/:slug", get(get_media))
            .route("/media/:slug/download", get(download_media))
            .with_state(state);
        (router, uploads)
    }

    #[tokio::test]
    async fn test_get_unknown_media_serves_default_inline() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _) = app(dir.path());

        let response = router
            .oneshot(Request::get("/media/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], DEFAULT_BYTES);
    }

    #[tokio::test]
    async fn test_download_sets_disposition_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let (router, uploads) = app(dir.path());
        let record = uploads
            .upload(
                Some(IncomingFile {
                    bytes: b"png!".to_vec(),
                    original_filename: "Trip Photo.PNG".to_string(),
                    declared_size: 4,
                }),
                "Trip Photo",
                None,
                uuid::Uuid::new_v4(),
            )
            .await
            .unwrap();

        let uri = format!("/media/{}/download", record.slug);
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"trip-photo-acme.png\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "4");
    }

    #[tokio::test]
    async fn test_download_with_newline_label_keeps_disposition() {
        let dir = tempfile::tempdir().unwrap();
        let (router, uploads) = app(dir.path());
        let record = uploads
            .upload(
                Some(IncomingFile {
                    bytes: b"png!".to_vec(),
                    original_filename: "trip.png".to_string(),
                    declared_size: 4,
                }),
                "Trip\nPhoto",
                None,
                uuid::Uuid::new_v4(),
            )
            .await
            .unwrap();

        let uri = format!("/media/{}/download", record.slug);
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"trip-photo-acme.png\""
        );
    }

    #[test]
    fn test_attachment_disposition_rewrites_unencodable_names() {
        let response = media_response(MediaResponse {
            bytes: vec![1],
            mime_type: "image/png".to_string(),
            file_name: "a\r\nb\"é\\.png".to_string(),
            disposition: Disposition::Attachment,
            content_length: Some(1),
        });

        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"a--b-.png\""
        );
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1");
    }

    #[test]
    fn test_media_response_inline_has_no_disposition() {
        let response = media_response(MediaResponse {
            bytes: vec![1, 2, 3],
            mime_type: "image/gif".to_string(),
            file_name: "x.gif".to_string(),
            disposition: Disposition::Inline,
            content_length: None,
        });

        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/gif");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }
}
