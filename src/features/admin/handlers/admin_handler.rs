use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::cases::dtos::{AssignSeverityDto, CaseResponseDto};
use crate::features::cases::services::CaseService;
use crate::features::users::dtos::{CreateUserDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};

/// State for admin handlers
#[derive(Clone)]
pub struct AdminState {
    pub user_service: Arc<UserService>,
    pub case_service: Arc<CaseService>,
}

/// List all user accounts
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "List of users", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AdminState>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let users = state.user_service.list().await?;
    let total = users.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta::total(total)),
    )))
}

/// Provision a user account with an explicit role
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 409, description = "Username already taken")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AdminState>,
    AppJson(dto): AppJson<CreateUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state.user_service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user),
            Some("User created".to_string()),
            None,
        )),
    ))
}

/// Delete a user account (an admin cannot delete their own account)
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.user_service.delete(admin.id, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("User deleted".to_string()),
        None,
    )))
}

/// Assign severity to a case and derive its due date
#[utoipa::path(
    put,
    path = "/api/admin/cases/{id}/severity",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body = AssignSeverityDto,
    responses(
        (status = 200, description = "Severity assigned", body = ApiResponse<CaseResponseDto>),
        (status = 400, description = "Invalid severity"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Case not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn assign_severity(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AssignSeverityDto>,
) -> Result<Json<ApiResponse<CaseResponseDto>>> {
    let case = state
        .case_service
        .assign_severity(id, dto.severity, &admin)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(case),
        Some("Severity assigned".to_string()),
        None,
    )))
}
