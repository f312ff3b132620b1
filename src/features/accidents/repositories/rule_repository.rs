use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{map_referenced_delete, AppError, Result};
use crate::features::accidents::models::Rule;

/// Lookup/persist port for rules
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Rule>>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Rule>>;
    /// Insert when `id` is 0, otherwise rename the existing rule
    async fn save(&self, rule: Rule) -> Result<Rule>;
    async fn delete_by_id(&self, id: i32) -> Result<()>;
}

pub struct PgRuleRepository {
    pool: PgPool,
}

impl PgRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for PgRuleRepository {
    async fn find_all(&self) -> Result<Vec<Rule>> {
        sqlx::query_as::<_, Rule>("SELECT id, name FROM rules ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list rules: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Rule>> {
        sqlx::query_as::<_, Rule>("SELECT id, name FROM rules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get rule {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn save(&self, rule: Rule) -> Result<Rule> {
        let saved = if rule.id == 0 {
            sqlx::query_as::<_, Rule>("INSERT INTO rules (name) VALUES ($1) RETURNING id, name")
                .bind(&rule.name)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_as::<_, Rule>(
                "UPDATE rules SET name = $2 WHERE id = $1 RETURNING id, name",
            )
            .bind(rule.id)
            .bind(&rule.name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rule with id = {} not found", rule.id)))?
        };

        Ok(saved)
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_referenced_delete(e, format!("Rule {}", id)))?;

        Ok(())
    }
}
