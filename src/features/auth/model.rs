use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_INSPECTOR, ROLE_SUPER_ADMIN};

/// Principal extracted from a validated access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    /// Username the reporter account is keyed by
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }

    /// Inspectors and super admins may move accidents through the workflow
    pub fn can_review_accidents(&self) -> bool {
        self.is_super_admin() || self.has_role(ROLE_INSPECTOR)
    }
}
