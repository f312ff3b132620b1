use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::accidents::{
    dtos as accidents_dtos, handlers as accidents_handlers, models as accidents_models,
};
use crate::features::files::handlers as files_handlers;
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        users_handlers::get_me,
        users_handlers::register_me,
        // Accidents
        accidents_handlers::list_accidents,
        accidents_handlers::get_accident,
        accidents_handlers::create_accident,
        accidents_handlers::update_accident,
        accidents_handlers::change_accident_status,
        accidents_handlers::delete_accident,
        // Catalog (public)
        accidents_handlers::list_accident_types,
        accidents_handlers::list_rules,
        accidents_handlers::get_rule,
        // Admin
        accidents_handlers::create_accident_type,
        accidents_handlers::delete_accident_type,
        accidents_handlers::create_rule,
        accidents_handlers::delete_rule,
        // Files
        files_handlers::download_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Users
            users_dtos::UserResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            // Accidents
            accidents_models::AccidentStatus,
            accidents_dtos::AccidentResponseDto,
            accidents_dtos::AccidentUploadDto,
            accidents_dtos::SaveAccidentResponseDto,
            accidents_dtos::DeleteAccidentResponseDto,
            accidents_dtos::UpdateAccidentStatusDto,
            ApiResponse<accidents_dtos::AccidentResponseDto>,
            ApiResponse<Vec<accidents_dtos::AccidentResponseDto>>,
            ApiResponse<accidents_dtos::SaveAccidentResponseDto>,
            ApiResponse<accidents_dtos::DeleteAccidentResponseDto>,
            // Catalog
            accidents_dtos::AccidentTypeDto,
            accidents_dtos::RuleDto,
            accidents_dtos::CreateCatalogEntryDto,
            ApiResponse<Vec<accidents_dtos::AccidentTypeDto>>,
            ApiResponse<accidents_dtos::AccidentTypeDto>,
            ApiResponse<Vec<accidents_dtos::RuleDto>>,
            ApiResponse<accidents_dtos::RuleDto>,
        )
    ),
    tags(
        (name = "users", description = "Reporter accounts"),
        (name = "accidents", description = "Accident reports and review workflow"),
        (name = "catalog", description = "Accident types and traffic rules (public)"),
        (name = "files", description = "Accident photos"),
        (name = "admin", description = "Catalog maintenance (super admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Accident Tracker API",
        version = "0.1.0",
        description = "API documentation for the accident tracker",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
