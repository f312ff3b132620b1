use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::services::UserService;
use crate::shared::types::ApiResponse;

/// Get the reporter account of the caller
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Reporter account", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Caller is not registered as a reporter")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let account = service.find_by_username(&user.username).await?;
    Ok(Json(ApiResponse::success(Some(account.into()), None, None)))
}

/// Register the caller as a reporter
///
/// Idempotent: a second call returns the existing account.
#[utoipa::path(
    put,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Reporter account", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn register_me(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let account = service.register(&user.username).await?;
    Ok(Json(ApiResponse::success(Some(account.into()), None, None)))
}
