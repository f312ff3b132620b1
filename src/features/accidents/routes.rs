use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::features::accidents::handlers;
use crate::features::accidents::services::AccidentService;

/// Accident endpoints; every handler requires an authenticated caller
pub fn routes(service: Arc<AccidentService>) -> Router {
    Router::new()
        .route(
            "/api/accidents",
            get(handlers::list_accidents).post(handlers::create_accident),
        )
        .route(
            "/api/accidents/{id}",
            get(handlers::get_accident)
                .put(handlers::update_accident)
                .delete(handlers::delete_accident),
        )
        .route(
            "/api/accidents/{id}/status",
            patch(handlers::change_accident_status),
        )
        .route(
            "/api/admin/accident-types",
            post(handlers::create_accident_type),
        )
        .route(
            "/api/admin/accident-types/{id}",
            delete(handlers::delete_accident_type),
        )
        .route("/api/admin/rules", post(handlers::create_rule))
        .route("/api/admin/rules/{id}", delete(handlers::delete_rule))
        .with_state(service)
}

/// Read-only catalog, reachable without a token
pub fn public_routes(service: Arc<AccidentService>) -> Router {
    Router::new()
        .route("/api/accident-types", get(handlers::list_accident_types))
        .route("/api/rules", get(handlers::list_rules))
        .route("/api/rules/{id}", get(handlers::get_rule))
        .with_state(service)
}
