use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::cases::dtos::{
    CaseResponseDto, CaseStatsDto, CreateCaseDto, UpdateCaseDto,
};
use crate::features::cases::services::CaseService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List cases, newest first, each with its current SLA status
#[utoipa::path(
    get,
    path = "/api/cases",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of cases", body = ApiResponse<Vec<CaseResponseDto>>),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn list_cases(
    _user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    AppQuery(params): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<CaseResponseDto>>>> {
    let (items, total) = service.list(params.offset(), params.limit()).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::page(&params, total)),
    )))
}

/// Report a new case
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateCaseDto,
    responses(
        (status = 201, description = "Case created", body = ApiResponse<CaseResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn create_case(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    AppJson(dto): AppJson<CreateCaseDto>,
) -> Result<(StatusCode, Json<ApiResponse<CaseResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let case = service.create(dto, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(case),
            Some("Case created".to_string()),
            None,
        )),
    ))
}

/// Get case by ID
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Case found", body = ApiResponse<CaseResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn get_case(
    _user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CaseResponseDto>>> {
    let case = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(case), None, None)))
}

/// Update case status and solution details
#[utoipa::path(
    put,
    path = "/api/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body = UpdateCaseDto,
    responses(
        (status = 200, description = "Case updated", body = ApiResponse<CaseResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn update_case(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCaseDto>,
) -> Result<Json<ApiResponse<CaseResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let case = service.update_status(id, dto, &user).await?;
    Ok(Json(ApiResponse::success(
        Some(case),
        Some("Case updated".to_string()),
        None,
    )))
}

/// Case counters for the dashboard
#[utoipa::path(
    get,
    path = "/api/cases/stats",
    responses(
        (status = 200, description = "Case counters", body = ApiResponse<CaseStatsDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn get_stats(
    _user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
) -> Result<Json<ApiResponse<CaseStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}
