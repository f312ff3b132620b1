use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::services::FileService;

/// Download an accident photo
///
/// Returns the raw bytes with the content type recorded at upload time.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = i32, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "Photo bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    _user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let (file, data) = service.download(id).await?;

    let disposition = format!("inline; filename=\"{}\"", file.original_filename.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}
