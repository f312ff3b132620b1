use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::accidents::dtos::{AccidentTypeDto, CreateCatalogEntryDto, RuleDto};
use crate::features::accidents::services::AccidentService;
use crate::features::auth::guards::RequireSuperAdmin;
use crate::shared::types::{ApiResponse, Meta};

/// List accident types
#[utoipa::path(
    get,
    path = "/api/accident-types",
    tag = "catalog",
    responses(
        (status = 200, description = "All accident types", body = ApiResponse<Vec<AccidentTypeDto>>)
    )
)]
pub async fn list_accident_types(
    State(service): State<Arc<AccidentService>>,
) -> Result<Json<ApiResponse<Vec<AccidentTypeDto>>>> {
    let types: Vec<AccidentTypeDto> = service
        .find_all_accident_types()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = types.len();

    Ok(Json(ApiResponse::success(
        Some(types),
        None,
        Some(Meta::total(total)),
    )))
}

/// List traffic rules
#[utoipa::path(
    get,
    path = "/api/rules",
    tag = "catalog",
    responses(
        (status = 200, description = "All rules", body = ApiResponse<Vec<RuleDto>>)
    )
)]
pub async fn list_rules(
    State(service): State<Arc<AccidentService>>,
) -> Result<Json<ApiResponse<Vec<RuleDto>>>> {
    let rules: Vec<RuleDto> = service
        .find_all_accident_rules()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = rules.len();

    Ok(Json(ApiResponse::success(
        Some(rules),
        None,
        Some(Meta::total(total)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/rules/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule found", body = ApiResponse<RuleDto>),
        (status = 404, description = "Rule not found")
    )
)]
pub async fn get_rule(
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RuleDto>>> {
    let rule = service.find_rule_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(rule.into()), None, None)))
}

/// Add an accident type (super admin)
#[utoipa::path(
    post,
    path = "/api/admin/accident-types",
    tag = "admin",
    request_body = CreateCatalogEntryDto,
    responses(
        (status = 201, description = "Accident type created", body = ApiResponse<AccidentTypeDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Super admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_accident_type(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<AccidentService>>,
    AppJson(dto): AppJson<CreateCatalogEntryDto>,
) -> Result<(StatusCode, Json<ApiResponse<AccidentTypeDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = service.create_accident_type(dto.name.trim()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created.into()), None, None)),
    ))
}

/// Remove an accident type no accident uses (super admin)
#[utoipa::path(
    delete,
    path = "/api/admin/accident-types/{id}",
    tag = "admin",
    params(("id" = i32, Path, description = "Accident type ID")),
    responses(
        (status = 200, description = "Accident type deleted"),
        (status = 403, description = "Super admin access required"),
        (status = 404, description = "Accident type not found"),
        (status = 409, description = "Accident type still in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_accident_type(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_accident_type_by_id(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Accident type deleted".to_string()),
        None,
    )))
}

/// Add a rule (super admin)
#[utoipa::path(
    post,
    path = "/api/admin/rules",
    tag = "admin",
    request_body = CreateCatalogEntryDto,
    responses(
        (status = 201, description = "Rule created", body = ApiResponse<RuleDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Super admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_rule(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<AccidentService>>,
    AppJson(dto): AppJson<CreateCatalogEntryDto>,
) -> Result<(StatusCode, Json<ApiResponse<RuleDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = service.create_rule(dto.name.trim()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created.into()), None, None)),
    ))
}

/// Remove a rule no accident cites (super admin)
#[utoipa::path(
    delete,
    path = "/api/admin/rules/{id}",
    tag = "admin",
    params(("id" = i32, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule deleted"),
        (status = 403, description = "Super admin access required"),
        (status = 404, description = "Rule not found"),
        (status = 409, description = "Rule still cited by accidents")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_rule(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_rule_by_id(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Rule deleted".to_string()),
        None,
    )))
}
