use std::sync::Arc;

use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;

/// Service for reporter accounts
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register the authenticated principal as a reporter.
    ///
    /// Calling it again for a known username returns the existing account.
    pub async fn register(&self, username: &str) -> Result<User> {
        if let Some(existing) = self.users.find_by_username(username).await? {
            return Ok(existing);
        }

        let user = self.users.save(User::new(username)).await?;
        info!("Registered reporter: id={}, username={}", user.id, user.username);
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))
    }
}
