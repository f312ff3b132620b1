use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{get_extension_from_content_type, FileUpload};
use crate::features::files::models::File;
use crate::modules::storage::MinIOClient;

/// Storage port for accident photos
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist the payload and return its handle
    async fn save(&self, upload: FileUpload) -> Result<File>;

    /// Remove the payload and its handle; `NotFound` if the id is unknown
    async fn delete_by_id(&self, id: i32) -> Result<()>;
}

/// Stores photo bytes in MinIO and metadata in the `files` table
pub struct FileService {
    pool: PgPool,
    minio_client: Arc<MinIOClient>,
}

impl FileService {
    pub fn new(pool: PgPool, minio_client: Arc<MinIOClient>) -> Self {
        Self { pool, minio_client }
    }

    /// Object key for a new upload: `accidents/{uuid}.{extension}`
    fn object_key(upload: &FileUpload) -> String {
        let extension = get_extension_from_content_type(&upload.content_type)
            .or_else(|| upload.original_filename.rsplit_once('.').map(|(_, ext)| ext))
            .unwrap_or("bin");

        format!("accidents/{}.{}", Uuid::new_v4(), extension)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<File>> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT id, file_key, original_filename, content_type, file_size, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get file {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    /// Metadata and bytes of a stored photo
    pub async fn download(&self, id: i32) -> Result<(File, Vec<u8>)> {
        let file = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File with id = {} not found", id)))?;

        let data = self.minio_client.download(&file.file_key).await?;
        Ok((file, data))
    }
}

#[async_trait]
impl FileStore for FileService {
    async fn save(&self, upload: FileUpload) -> Result<File> {
        let file_key = Self::object_key(&upload);
        let file_size = upload.data.len() as i64;

        self.minio_client
            .upload(&file_key, &upload.data, &upload.content_type)
            .await?;

        debug!("File uploaded to MinIO: {}", file_key);

        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (file_key, original_filename, content_type, file_size)
            VALUES ($1, $2, $3, $4)
            RETURNING id, file_key, original_filename, content_type, file_size, created_at
            "#,
        )
        .bind(&file_key)
        .bind(&upload.original_filename)
        .bind(&upload.content_type)
        .bind(file_size)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "File metadata saved: id={}, key={}, size={}",
            file.id, file.file_key, file.file_size
        );

        Ok(file)
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        let file = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File with id = {} not found", id)))?;

        self.minio_client.delete(&file.file_key).await?;

        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(file.id)
            .execute(&self.pool)
            .await?;

        info!("File deleted: id={}, key={}", file.id, file.file_key);

        Ok(())
    }
}
