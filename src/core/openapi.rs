use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::handlers as admin_handlers;
use crate::features::auth;
use crate::features::cases::{
    dtos as cases_dtos, handlers as cases_handlers, models as cases_models,
};
use crate::features::users::{dtos as users_dtos, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        auth::handlers::logout,
        // Cases
        cases_handlers::list_cases,
        cases_handlers::create_case,
        cases_handlers::get_case,
        cases_handlers::update_case,
        cases_handlers::get_stats,
        // Admin
        admin_handlers::list_users,
        admin_handlers::create_user,
        admin_handlers::delete_user,
        admin_handlers::assign_severity,
    ),
    components(
        schemas(
            Meta,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthUserDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::AuthUserDto>,
            // Users
            users_models::Role,
            users_dtos::CreateUserDto,
            users_dtos::UserResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Cases
            cases_models::Severity,
            cases_models::CaseStatus,
            cases_models::SlaStatus,
            cases_dtos::CreateCaseDto,
            cases_dtos::UpdateCaseDto,
            cases_dtos::AssignSeverityDto,
            cases_dtos::CaseResponseDto,
            cases_dtos::CaseStatsDto,
            ApiResponse<cases_dtos::CaseResponseDto>,
            ApiResponse<Vec<cases_dtos::CaseResponseDto>>,
            ApiResponse<cases_dtos::CaseStatsDto>,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "cases", description = "Support case reporting, tracking and SLA status"),
        (name = "admin", description = "User provisioning and severity assignment (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Casedesk API",
        version = "0.1.0",
        description = "API documentation for Casedesk",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme to the OpenAPI document
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
