use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Default cap on upload size (10 MB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_public_key: String,
    pub storage_type: StorageType,
    pub uploads_root: PathBuf,
    pub default_asset: String,
    pub site_name: String,
    pub upload_field: String,
    pub max_upload_bytes: usize,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub server_port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub enum StorageType {
    Local,
    S3,
}

impl std::str::FromStr for StorageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "s3" | "remote" => Ok(StorageType::S3),
            _ => Err(anyhow::anyhow!("Invalid storage type: {}", s)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            jwt_public_key: env::var("JWT_PUBLIC_KEY")
                .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY must be set"))?,
            storage_type: env::var("STORAGE_TYPE")
                .unwrap_or_else(|_| "local".to_string())
                .parse()?,
            uploads_root: env::var("UPLOADS_ROOT")
                .unwrap_or_else(|_| "storage/app/public/uploads".to_string())
                .into(),
            default_asset: env::var("DEFAULT_ASSET").unwrap_or_else(|_| "default.jpg".to_string()),
            site_name: env::var("SITE_NAME").unwrap_or_else(|_| "default".to_string()),
            upload_field: env::var("UPLOAD_FIELD").unwrap_or_else(|_| "media".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES: {}", e))?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid SERVER_PORT: {}", e))?,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_type == StorageType::S3 && self.s3_bucket.is_none() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set for S3 storage"));
        }
        if self.upload_field.is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_FIELD must not be empty"));
        }
        if self.default_asset.contains('/') || self.default_asset.contains("..") {
            return Err(anyhow::anyhow!(
                "DEFAULT_ASSET must be a plain file name under UPLOADS_ROOT"
            ));
        }
        Ok(())
    }

    /// Staging area for files on their way to remote storage
    pub fn staging_dir(&self) -> PathBuf {
        self.uploads_root.join("tempuploads")
    }
}

#[cfg(test)]
pub(crate) fn test_config(uploads_root: impl Into<PathBuf>) -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        jwt_public_key: String::new(),
        storage_type: StorageType::Local,
        uploads_root: uploads_root.into(),
        default_asset: "default.jpg".to_string(),
        site_name: "acme".to_string(),
        upload_field: "media".to_string(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        s3_access_key: None,
        s3_secret_key: None,
        server_port: 3000,
    }
}
