use crate::models::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Errors produced by the upload and retrieval paths
#[derive(Debug, Error)]
pub enum MediaError {
    /// The request carried no file (or an empty one). An expected outcome.
    #[error("No file provided")]
    NoFileProvided,

    #[error("File size {size} bytes exceeds maximum allowed size of {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A resolved path would land outside the configured root
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    /// Backend-level miss. Retrieval turns this into the default asset.
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MediaError::NoFileProvided => StatusCode::BAD_REQUEST,
            MediaError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            MediaError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MediaError::NotFound(_) => StatusCode::NOT_FOUND,
            MediaError::InvalidPath(_) | MediaError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the logs
        let message = match &self {
            MediaError::InvalidPath(_) | MediaError::Persistence(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            MediaError::NoFileProvided.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MediaError::StorageUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            MediaError::InvalidPath("../x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            MediaError::FileTooLarge { size: 2, max: 1 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
