//! Role-based authorization guards.
//!
//! These guards extract the authenticated user and verify they have the required roles.
//! - super_admin: maintains accident types and rules, can do everything
//! - inspector: changes accident status

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard allowing only users with the "super_admin" role.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireSuperAdmin(user): RequireSuperAdmin) { ... }
/// ```
pub struct RequireSuperAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.is_super_admin() {
            return Err(AppError::Forbidden(
                "Super admin access required".to_string(),
            ));
        }

        Ok(RequireSuperAdmin(user.clone()))
    }
}

/// Guard allowing users who may review accidents ("inspector" or "super_admin").
pub struct RequireInspector(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireInspector
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.can_review_accidents() {
            return Err(AppError::Forbidden("Inspector access required".to_string()));
        }

        Ok(RequireInspector(user.clone()))
    }
}
