use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::users::models::User;

/// Lookup/persist port for reporters
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert the user, or return the existing row when the username is taken
    async fn save(&self, user: User) -> Result<User>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, enabled
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find user '{}': {:?}", username, e);
            AppError::Database(e)
        })
    }

    async fn save(&self, user: User) -> Result<User> {
        // The no-op update makes RETURNING yield the existing row on conflict
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, enabled)
            VALUES ($1, $2)
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING id, username, enabled
            "#,
        )
        .bind(&user.username)
        .bind(user.enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save user '{}': {:?}", user.username, e);
            AppError::Database(e)
        })
    }
}
