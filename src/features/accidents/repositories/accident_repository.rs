use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::core::error::{AppError, Result};
use crate::features::accidents::models::{Accident, AccidentStatus, AccidentType, Rule};
use crate::features::users::models::User;

/// Lookup/persist port for accidents
#[async_trait]
pub trait AccidentRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Accident>>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Accident>>;

    /// Custom finder kept next to `find_by_id`; absence is a value, not an error
    async fn find_accident_by_id(&self, id: i32) -> Result<Option<Accident>>;

    /// Insert when `id` is 0, otherwise update the existing row.
    ///
    /// Fails with `NotFound` when updating an id that does not exist.
    async fn save(&self, accident: Accident) -> Result<Accident>;

    async fn delete_by_id(&self, id: i32) -> Result<()>;
}

/// Accident row joined with its type and reporter
#[derive(Debug, FromRow)]
struct AccidentRow {
    id: i32,
    name: String,
    text: String,
    address: String,
    status: AccidentStatus,
    file_id: Option<i32>,
    created_at: DateTime<Utc>,
    type_id: i32,
    type_name: String,
    user_id: i32,
    username: String,
    user_enabled: bool,
}

impl AccidentRow {
    fn into_accident(self, rules: HashSet<Rule>) -> Accident {
        Accident {
            id: self.id,
            name: self.name,
            text: self.text,
            address: self.address,
            status: self.status,
            accident_type: AccidentType::new(self.type_id, self.type_name),
            user: Some(User {
                id: self.user_id,
                username: self.username,
                enabled: self.user_enabled,
            }),
            rules,
            file_id: self.file_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AccidentRuleRow {
    accident_id: i32,
    id: i32,
    name: String,
}

const SELECT_ACCIDENTS: &str = r#"
    SELECT
        a.id, a.name, a.text, a.address, a.status, a.file_id, a.created_at,
        t.id AS type_id, t.name AS type_name,
        u.id AS user_id, u.username, u.enabled AS user_enabled
    FROM accidents a
    JOIN accident_types t ON t.id = a.type_id
    JOIN users u ON u.id = a.user_id
"#;

pub struct PgAccidentRepository {
    pool: PgPool,
}

impl PgAccidentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the rule sets of the given accidents, keyed by accident id
    async fn load_rules(&self, accident_ids: &[i32]) -> Result<HashMap<i32, HashSet<Rule>>> {
        let rows = sqlx::query_as::<_, AccidentRuleRow>(
            r#"
            SELECT ar.accident_id, r.id, r.name
            FROM accident_rules ar
            JOIN rules r ON r.id = ar.rule_id
            WHERE ar.accident_id = ANY($1)
            "#,
        )
        .bind(accident_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load accident rules: {:?}", e);
            AppError::Database(e)
        })?;

        let mut rules: HashMap<i32, HashSet<Rule>> = HashMap::new();
        for row in rows {
            rules
                .entry(row.accident_id)
                .or_default()
                .insert(Rule::new(row.id, row.name));
        }
        Ok(rules)
    }

    async fn fetch_one(&self, id: i32) -> Result<Option<Accident>> {
        let row = sqlx::query_as::<_, AccidentRow>(&format!("{} WHERE a.id = $1", SELECT_ACCIDENTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get accident {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut rules = self.load_rules(&[row.id]).await?;
        let accident_rules = rules.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_accident(accident_rules)))
    }
}

#[async_trait]
impl AccidentRepository for PgAccidentRepository {
    async fn find_all(&self) -> Result<Vec<Accident>> {
        let rows = sqlx::query_as::<_, AccidentRow>(SELECT_ACCIDENTS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list accidents: {:?}", e);
                AppError::Database(e)
            })?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut rules = self.load_rules(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let accident_rules = rules.remove(&row.id).unwrap_or_default();
                row.into_accident(accident_rules)
            })
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Accident>> {
        self.fetch_one(id).await
    }

    async fn find_accident_by_id(&self, id: i32) -> Result<Option<Accident>> {
        self.fetch_one(id).await
    }

    async fn save(&self, mut accident: Accident) -> Result<Accident> {
        let user_id = accident
            .user
            .as_ref()
            .map(|u| u.id)
            .ok_or_else(|| AppError::Internal("Accident has no reporter assigned".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i32, DateTime<Utc>) = if accident.is_new() {
            sqlx::query_as(
                r#"
                INSERT INTO accidents (name, text, address, status, type_id, user_id, file_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, created_at
                "#,
            )
            .bind(&accident.name)
            .bind(&accident.text)
            .bind(&accident.address)
            .bind(accident.status)
            .bind(accident.accident_type.id)
            .bind(user_id)
            .bind(accident.file_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as(
                r#"
                UPDATE accidents
                SET name = $2, text = $3, address = $4, status = $5,
                    type_id = $6, user_id = $7, file_id = $8
                WHERE id = $1
                RETURNING id, created_at
                "#,
            )
            .bind(accident.id)
            .bind(&accident.name)
            .bind(&accident.text)
            .bind(&accident.address)
            .bind(accident.status)
            .bind(accident.accident_type.id)
            .bind(user_id)
            .bind(accident.file_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Accident with id = {} not found", accident.id))
            })?
        };

        // Rule links are replaced wholesale on every save
        sqlx::query("DELETE FROM accident_rules WHERE accident_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let rule_ids: Vec<i32> = accident.rules.iter().map(|r| r.id).collect();
        sqlx::query(
            r#"
            INSERT INTO accident_rules (accident_id, rule_id)
            SELECT $1, UNNEST($2::int[])
            "#,
        )
        .bind(id)
        .bind(&rule_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        accident.id = id;
        accident.created_at = created_at;
        Ok(accident)
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM accidents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete accident {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(())
    }
}
