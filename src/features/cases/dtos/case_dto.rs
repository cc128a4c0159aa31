use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::cases::models::{Case, CaseStatus, Severity, SlaStatus};

/// Request DTO for reporting a new case
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCaseDto {
    #[validate(length(min = 1, max = 200, message = "Case title must be 1-200 characters"))]
    pub case_title: String,

    #[validate(length(min = 1, max = 10000, message = "Problem description is required"))]
    pub problem_description: String,

    /// Display name of the reporter; defaults to the caller's full name
    #[validate(length(min = 1, max = 100, message = "Reporter name must be 1-100 characters"))]
    pub reported_by: Option<String>,
}

/// Request DTO for updating a case's status
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCaseDto {
    pub status: CaseStatus,

    /// Omit to keep the current solution details
    #[validate(length(max = 10000, message = "Solution details must be at most 10000 characters"))]
    pub solution_details: Option<String>,
}

/// Request DTO for assigning severity (admin only)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignSeverityDto {
    pub severity: Severity,
}

/// Response DTO for a case, including its SLA label evaluated at response time
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseResponseDto {
    pub id: Uuid,
    pub case_title: String,
    pub problem_description: String,
    pub solution_details: Option<String>,
    pub reported_by: String,
    pub reported_by_user_id: Option<Uuid>,
    pub status: CaseStatus,
    pub severity: Option<Severity>,
    pub assigned_by_user_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sla_status: SlaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseResponseDto {
    pub fn from_case(case: Case, now: DateTime<Utc>) -> Self {
        let sla_status = case.sla_status(now);
        Self {
            id: case.id,
            case_title: case.title,
            problem_description: case.description,
            solution_details: case.solution_details,
            reported_by: case.reported_by,
            reported_by_user_id: case.reported_by_user_id,
            status: case.status,
            severity: case.severity,
            assigned_by_user_id: case.assigned_by_user_id,
            due_date: case.due_date,
            resolved_at: case.resolved_at,
            sla_status,
            created_at: case.created_at,
            updated_at: case.updated_at,
        }
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CaseStatsDto {
    pub total: i64,
    pub open: i64,
    pub overdue: i64,
    pub resolved: i64,
}
