use std::sync::Arc;

use crate::models::JwtClaims;
use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use uuid::Uuid;

/// Pull the bearer token out of the Authorization header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| anyhow::anyhow!("Missing authorization header"))?
        .to_str()
        .map_err(|_| anyhow::anyhow!("Invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Invalid authorization header format"))
}

/// Build the ES256 key from the base64 body of a PEM public key
pub fn decode_key(public_key: &str) -> Result<DecodingKey> {
    let pem = format!(
        "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
        public_key.trim()
    );
    DecodingKey::from_ec_pem(pem.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to create decoding key: {}", e))
}

/// Validate the token and return the owner id carried in its `uuid` claim
pub fn owner_from_token(token: &str, public_key: &DecodingKey) -> Result<Uuid> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_exp = true;

    let claims = decode::<JwtClaims>(token, public_key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid JWT token: {}", e))?
        .claims;

    Uuid::parse_str(&claims.uuid).map_err(|e| anyhow::anyhow!("Invalid UUID in token: {}", e))
}

/// Authenticated uploader
#[derive(Debug, Clone, Copy)]
pub struct AuthOwner(pub Uuid);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthOwner
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        // Inserted by the public key middleware
        let public_key = parts
            .extensions
            .get::<Arc<DecodingKey>>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Public key not found in state".to_string(),
                )
            })?;

        let unauthorized = |e: anyhow::Error| {
            (
                StatusCode::UNAUTHORIZED,
                format!("Authentication failed: {}", e),
            )
        };

        let token = extract_bearer(&parts.headers).map_err(unauthorized)?;
        let owner = owner_from_token(token, &public_key).map_err(unauthorized)?;

        Ok(AuthOwner(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_bearer(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer token123"));
        assert_eq!(extract_bearer(&headers).unwrap(), "token123");
    }

    #[test]
    fn test_decode_key_rejects_garbage() {
        assert!(decode_key("not a key").is_err());
    }
}
