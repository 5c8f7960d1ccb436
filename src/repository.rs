use crate::error::MediaResult;
use crate::models::UploadRecord;
use async_trait::async_trait;
use sqlx::PgPool;

/// Persistence of upload metadata, keyed by slug
#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn create(&self, record: &UploadRecord) -> MediaResult<()>;

    async fn find_by_slug(&self, slug: &str) -> MediaResult<Option<UploadRecord>>;
}

pub struct PgUploadRepository {
    db: PgPool,
}

impl PgUploadRepository {
    pub fn new(db: PgPool) -> Self {
        PgUploadRepository { db }
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    async fn create(&self, record: &UploadRecord) -> MediaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO uploads
                (id, owner_id, slug, original_name, display_name, extension,
                 size_bytes, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.slug)
        .bind(&record.original_name)
        .bind(&record.display_name)
        .bind(&record.extension)
        .bind(record.size_bytes)
        .bind(&record.description)
        .bind(record.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> MediaResult<Option<UploadRecord>> {
        let record = sqlx::query_as::<_, UploadRecord>(
            r#"
            SELECT id, owner_id, slug, original_name, display_name, extension,
                   size_bytes, description, created_at
            FROM uploads
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;

        Ok(record)
    }
}
