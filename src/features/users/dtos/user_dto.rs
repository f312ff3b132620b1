use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::users::models::User;

/// Response DTO for a reporter account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: i32,
    pub username: String,
    pub enabled: bool,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            enabled: u.enabled,
        }
    }
}
