use std::sync::Arc;
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::cases::dtos::{
    CaseResponseDto, CaseStatsDto, CreateCaseDto, UpdateCaseDto,
};
use crate::features::cases::models::{
    CaseStatus, NewCase, Severity, SeverityAssignment, SlaStatus, StatusChange,
};
use crate::features::cases::repository::CaseRepository;

/// Service for case operations.
///
/// Every response carries an SLA label evaluated against the injected clock at
/// the moment of the call.
pub struct CaseService {
    repo: Arc<dyn CaseRepository>,
    clock: Arc<dyn Clock>,
}

impl CaseService {
    pub fn new(repo: Arc<dyn CaseRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create(
        &self,
        dto: CreateCaseDto,
        user: &AuthenticatedUser,
    ) -> Result<CaseResponseDto> {
        let reported_by = dto
            .reported_by
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.full_name.clone());

        let now = self.clock.now();
        let case = self
            .repo
            .insert(
                NewCase {
                    title: dto.case_title,
                    description: dto.problem_description,
                    reported_by,
                    reported_by_user_id: Some(user.id),
                },
                now,
            )
            .await?;

        tracing::info!("Case created: id={}, reporter={}", case.id, user.username);

        Ok(CaseResponseDto::from_case(case, now))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CaseResponseDto> {
        let case = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Case '{}' not found", id)))?;

        Ok(CaseResponseDto::from_case(case, self.clock.now()))
    }

    /// Newest first, with the total number of cases
    pub async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<CaseResponseDto>, i64)> {
        let (cases, total) = self.repo.list_page(offset, limit).await?;
        let now = self.clock.now();

        let items = cases
            .into_iter()
            .map(|case| CaseResponseDto::from_case(case, now))
            .collect();

        Ok((items, total))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        dto: UpdateCaseDto,
        user: &AuthenticatedUser,
    ) -> Result<CaseResponseDto> {
        let change = StatusChange {
            status: dto.status,
            solution_details: dto.solution_details,
        };

        let now = self.clock.now();
        let case = self
            .repo
            .update_status(id, &change, now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Case '{}' not found", id)))?;

        tracing::info!(
            "Case status updated: id={}, status={}, by={}",
            case.id,
            case.status,
            user.username
        );

        Ok(CaseResponseDto::from_case(case, now))
    }

    pub async fn assign_severity(
        &self,
        id: Uuid,
        severity: Severity,
        admin: &AuthenticatedUser,
    ) -> Result<CaseResponseDto> {
        let assignment = SeverityAssignment {
            severity,
            assigned_by: admin.id,
        };

        let now = self.clock.now();
        let case = self
            .repo
            .assign_severity(id, &assignment, now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Case '{}' not found", id)))?;

        tracing::info!(
            "Severity assigned: id={}, severity={}, due_date={:?}, by={}",
            case.id,
            severity,
            case.due_date,
            admin.username
        );

        Ok(CaseResponseDto::from_case(case, now))
    }

    pub async fn stats(&self) -> Result<CaseStatsDto> {
        let cases = self.repo.list_all().await?;
        let now = self.clock.now();

        let stats = cases.iter().fold(CaseStatsDto::default(), |mut acc, case| {
            acc.total += 1;
            match case.status {
                CaseStatus::Open => acc.open += 1,
                CaseStatus::Resolved => acc.resolved += 1,
                CaseStatus::InProgress => {}
            }
            if case.sla_status(now) == SlaStatus::Overdue {
                acc.overdue += 1;
            }
            acc
        });

        Ok(stats)
    }
}
