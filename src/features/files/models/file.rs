use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Metadata row of a stored photo; the bytes live in object storage under `file_key`
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i32,
    pub file_key: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}
