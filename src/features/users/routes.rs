use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::users::handlers;
use crate::features::users::services::UserService;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route(
            "/api/users/me",
            get(handlers::get_me).put(handlers::register_me),
        )
        .with_state(service)
}
