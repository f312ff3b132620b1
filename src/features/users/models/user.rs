use sqlx::FromRow;

/// Reporter of accidents, keyed by the username carried in the access token
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub enabled: bool,
}

impl User {
    /// Unsaved user (id 0) for the given username
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            enabled: true,
        }
    }
}
