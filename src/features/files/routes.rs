use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::files::handlers::download_file;
use crate::features::files::services::FileService;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route("/api/files/{id}", get(download_file))
        .with_state(file_service)
}
