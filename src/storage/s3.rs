use super::remote::{EntryKind, ObjectEntry, ObjectStore};
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Credentials, primitives::ByteStream, Client};

/// S3 bucket seen as an object store: common prefixes are directories,
/// directory markers are zero-byte `<name>/` objects.
pub struct S3ObjectStore {
    bucket: String,
    region: String,
    endpoint: Option<String>,
    credentials: Option<S3Credentials>,
}

struct S3Credentials {
    access_key: String,
    secret_key: String,
}

impl S3ObjectStore {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(S3ObjectStore {
            bucket: config
                .s3_bucket
                .clone()
                .ok_or_else(|| anyhow::anyhow!("S3 bucket must be configured for S3 storage"))?,
            region: config
                .s3_region
                .clone()
                .unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: config.s3_endpoint.clone(),
            credentials: match (&config.s3_access_key, &config.s3_secret_key) {
                (Some(access), Some(secret)) => Some(S3Credentials {
                    access_key: access.clone(),
                    secret_key: secret.clone(),
                }),
                _ => None,
            },
        })
    }

    /// Get or create AWS S3 client
    async fn get_client(&self) -> Client {
        let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(self.region.clone()));

        // Add credentials if provided
        if let Some(creds) = &self.credentials {
            config_loader = config_loader.credentials_provider(Credentials::new(
                &creds.access_key,
                &creds.secret_key,
                None,
                None,
                "static",
            ));
        }

        let sdk_config = config_loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Client::from_conf(builder.build())
    }
}

fn prefix_for(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir.trim_end_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, dir: &str) -> Result<Vec<ObjectEntry>> {
        let client = self.get_client().await;
        let prefix = prefix_for(dir);
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .delimiter("/")
                .set_continuation_token(continuation.take())
                .send()
                .await?;

            for common in response.common_prefixes() {
                if let Some(full) = common.prefix() {
                    let path = full.trim_end_matches('/');
                    let name = path.strip_prefix(&prefix).unwrap_or(path);
                    entries.push(ObjectEntry {
                        kind: EntryKind::Directory,
                        name: name.to_string(),
                        path: path.to_string(),
                    });
                }
            }

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                // The marker object itself
                if key == prefix {
                    continue;
                }
                entries.push(ObjectEntry {
                    kind: EntryKind::File,
                    name: key.strip_prefix(&prefix).unwrap_or(key).to_string(),
                    path: key.to_string(),
                });
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn make_directory(&self, name: &str) -> Result<String> {
        let client = self.get_client().await;
        let path = name.trim_end_matches('/').to_string();

        client
            .put_object()
            .bucket(&self.bucket)
            .key(prefix_for(&path))
            .body(ByteStream::from(Vec::new()))
            .send()
            .await?;

        Ok(path)
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let client = self.get_client().await;
        let content_type = mime_guess::from_path(path).first_or_octet_stream();

        client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type.essence_str())
            .send()
            .await?;

        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let client = self.get_client().await;

        let response = client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await?;

        let bytes = response.body.collect().await?.into_bytes();
        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let client = self.get_client().await;

        client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await?;

        Ok(())
    }
}
