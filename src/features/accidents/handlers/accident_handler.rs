use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::accidents::dtos::{
    AccidentFormDto, AccidentResponseDto, AccidentUploadDto, DeleteAccidentResponseDto,
    SaveAccidentResponseDto, UpdateAccidentStatusDto,
};
use crate::features::accidents::services::{AccidentService, FileCleanup, SavedAccident};
use crate::features::auth::guards::RequireInspector;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::FileUpload;
use crate::shared::types::{ApiResponse, Meta};

/// Read and validate the accident form.
///
/// Accepts multipart/form-data with:
/// - `name`, `text`, `address`: required text fields
/// - `type_id`: accident type id (required)
/// - `rule_ids`: rule id, repeated once per rule (optional)
/// - `image`: photo of the scene (required)
async fn read_accident_form(mut multipart: Multipart) -> Result<AccidentFormDto> {
    let mut name: Option<String> = None;
    let mut text: Option<String> = None;
    let mut address: Option<String> = None;
    let mut type_id: Option<String> = None;
    let mut rule_ids: Vec<String> = Vec::new();
    let mut image: Option<FileUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "image" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let original_filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unnamed".to_string());
            let data = field.bytes().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read image data: {}", e))
            })?;

            image = Some(FileUpload {
                original_filename,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let slot = match field_name.as_str() {
            "name" => &mut name,
            "text" => &mut text,
            "address" => &mut address,
            "type_id" => &mut type_id,
            "rule_ids" => {
                rule_ids.push(read_text(field, "rule_ids").await?);
                continue;
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
                continue;
            }
        };
        *slot = Some(read_text(field, &field_name).await?);
    }

    let required = |value: Option<String>, field: &str| {
        value.ok_or_else(|| AppError::BadRequest(format!("Field '{}' is required", field)))
    };

    let raw_type_id = required(type_id, "type_id")?;
    let type_id = raw_type_id.trim().parse::<i32>().map_err(|e| {
        AppError::BadRequest(format!("Invalid type id '{}': {}", raw_type_id, e))
    })?;

    let form = AccidentFormDto {
        name: required(name, "name")?,
        text: required(text, "text")?,
        address: required(address, "address")?,
        type_id,
        rule_ids,
        image: image.ok_or_else(|| AppError::BadRequest("Image is required".to_string()))?,
    };

    form.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    form.image.ensure_acceptable()?;

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

fn cleanup_message(cleanup: &FileCleanup) -> Option<String> {
    match cleanup {
        FileCleanup::Pending { file_id, .. } => Some(format!(
            "Previous photo {} could not be removed and is scheduled for manual cleanup",
            file_id
        )),
        _ => None,
    }
}

fn saved_response(saved: SavedAccident) -> ApiResponse<SaveAccidentResponseDto> {
    let message = cleanup_message(&saved.cleanup);
    ApiResponse::success(
        Some(SaveAccidentResponseDto {
            accident: saved.accident.into(),
            file_cleanup_pending: saved.cleanup.is_pending(),
        }),
        message,
        None,
    )
}

/// List all accidents, ascending by id
#[utoipa::path(
    get,
    path = "/api/accidents",
    tag = "accidents",
    responses(
        (status = 200, description = "All accidents", body = ApiResponse<Vec<AccidentResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_accidents(
    _user: AuthenticatedUser,
    State(service): State<Arc<AccidentService>>,
) -> Result<Json<ApiResponse<Vec<AccidentResponseDto>>>> {
    let accidents = service.find_all().await?;
    let total = accidents.len();
    let data: Vec<AccidentResponseDto> = accidents.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(
        Some(data),
        None,
        Some(Meta::total(total)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/accidents/{id}",
    tag = "accidents",
    params(("id" = i32, Path, description = "Accident ID")),
    responses(
        (status = 200, description = "Accident found", body = ApiResponse<AccidentResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Accident not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_accident(
    _user: AuthenticatedUser,
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AccidentResponseDto>>> {
    let accident = service.find_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(accident.into()), None, None)))
}

/// Report a new accident with a photo
///
/// The caller becomes the reporter and the accident starts as `NEW`.
#[utoipa::path(
    post,
    path = "/api/accidents",
    tag = "accidents",
    request_body(content = AccidentUploadDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Accident created", body = ApiResponse<SaveAccidentResponseDto>),
        (status = 400, description = "Invalid form, rule id or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Unknown reporter, accident type or rule")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_accident(
    user: AuthenticatedUser,
    State(service): State<Arc<AccidentService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SaveAccidentResponseDto>>)> {
    let (accident, rule_ids, image) = read_accident_form(multipart).await?.into_draft();

    let saved = service
        .create_or_update_accident(&user.username, accident, &rule_ids, image)
        .await?;

    Ok((StatusCode::CREATED, Json(saved_response(saved))))
}

/// Replace an accident's fields and photo
///
/// Status is kept. The previous photo is removed after the accident is saved.
#[utoipa::path(
    put,
    path = "/api/accidents/{id}",
    tag = "accidents",
    params(("id" = i32, Path, description = "Accident ID")),
    request_body(content = AccidentUploadDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Accident updated", body = ApiResponse<SaveAccidentResponseDto>),
        (status = 400, description = "Invalid form, rule id or image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Unknown accident, reporter, accident type or rule")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_accident(
    user: AuthenticatedUser,
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<SaveAccidentResponseDto>>> {
    let form = read_accident_form(multipart).await?;
    let existing = service.find_by_id(id).await?;
    let (accident, rule_ids, image) = form.apply_to(existing);

    let saved = service
        .create_or_update_accident(&user.username, accident, &rule_ids, image)
        .await?;

    Ok(Json(saved_response(saved)))
}

/// Move an accident through the review workflow (inspector or super admin)
#[utoipa::path(
    patch,
    path = "/api/accidents/{id}/status",
    tag = "accidents",
    params(("id" = i32, Path, description = "Accident ID")),
    request_body = UpdateAccidentStatusDto,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<AccidentResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Inspector access required"),
        (status = 404, description = "Accident not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_accident_status(
    RequireInspector(_user): RequireInspector,
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
    AppJson(dto): AppJson<UpdateAccidentStatusDto>,
) -> Result<Json<ApiResponse<AccidentResponseDto>>> {
    let accident = service.change_status(id, dto.status).await?;
    Ok(Json(ApiResponse::success(
        Some(accident.into()),
        Some("Status updated".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/accidents/{id}",
    tag = "accidents",
    params(("id" = i32, Path, description = "Accident ID")),
    responses(
        (status = 200, description = "Accident deleted", body = ApiResponse<DeleteAccidentResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Accident not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_accident(
    _user: AuthenticatedUser,
    State(service): State<Arc<AccidentService>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DeleteAccidentResponseDto>>> {
    let cleanup = service.delete_by_id(id).await?;
    let message = cleanup_message(&cleanup).unwrap_or_else(|| "Accident deleted".to_string());

    Ok(Json(ApiResponse::success(
        Some(DeleteAccidentResponseDto {
            deleted: true,
            file_cleanup_pending: cleanup.is_pending(),
        }),
        Some(message),
        None,
    )))
}
