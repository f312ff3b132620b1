use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{map_referenced_delete, AppError, Result};
use crate::features::accidents::models::AccidentType;

/// Lookup/persist port for accident types
#[async_trait]
pub trait AccidentTypeRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<AccidentType>>;
    async fn find_by_id(&self, id: i32) -> Result<Option<AccidentType>>;
    /// Insert when `id` is 0, otherwise rename the existing type
    async fn save(&self, accident_type: AccidentType) -> Result<AccidentType>;
    async fn delete_by_id(&self, id: i32) -> Result<()>;
}

pub struct PgAccidentTypeRepository {
    pool: PgPool,
}

impl PgAccidentTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccidentTypeRepository for PgAccidentTypeRepository {
    async fn find_all(&self) -> Result<Vec<AccidentType>> {
        sqlx::query_as::<_, AccidentType>("SELECT id, name FROM accident_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list accident types: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<AccidentType>> {
        sqlx::query_as::<_, AccidentType>("SELECT id, name FROM accident_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get accident type {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn save(&self, accident_type: AccidentType) -> Result<AccidentType> {
        let saved = if accident_type.id == 0 {
            sqlx::query_as::<_, AccidentType>(
                "INSERT INTO accident_types (name) VALUES ($1) RETURNING id, name",
            )
            .bind(&accident_type.name)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, AccidentType>(
                "UPDATE accident_types SET name = $2 WHERE id = $1 RETURNING id, name",
            )
            .bind(accident_type.id)
            .bind(&accident_type.name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Accident type with id = {} not found",
                    accident_type.id
                ))
            })?
        };

        Ok(saved)
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM accident_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_referenced_delete(e, format!("Accident type {}", id)))?;

        Ok(())
    }
}
