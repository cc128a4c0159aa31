use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::cases::sla::{compute_due_date, compute_sla_status};

/// Severity tier assigned by an admin; drives the due-date offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Type)]
#[sqlx(type_name = "text")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Major, Severity::Minor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Major => "Major",
            Severity::Minor => "Minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Severity must be one of Critical, Major or Minor (got '{0}')")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// Case workflow status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema, Type,
)]
#[sqlx(type_name = "text")]
pub enum CaseStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 3] = [
        CaseStatus::Open,
        CaseStatus::InProgress,
        CaseStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Open",
            CaseStatus::InProgress => "In Progress",
            CaseStatus::Resolved => "Resolved",
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, CaseStatus::Resolved)
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Status must be one of Open, In Progress or Resolved (got '{0}')")]
pub struct ParseCaseStatusError(pub String);

impl FromStr for CaseStatus {
    type Err = ParseCaseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseCaseStatusError(s.to_string()))
    }
}

/// SLA label derived at read time, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SlaStatus {
    #[serde(rename = "Pending Assignment")]
    PendingAssignment,
    #[serde(rename = "Met SLA")]
    Met,
    #[serde(rename = "Breached SLA")]
    Breached,
    #[serde(rename = "OVERDUE")]
    Overdue,
    #[serde(rename = "In Progress")]
    InProgress,
}

impl SlaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaStatus::PendingAssignment => "Pending Assignment",
            SlaStatus::Met => "Met SLA",
            SlaStatus::Breached => "Breached SLA",
            SlaStatus::Overdue => "OVERDUE",
            SlaStatus::InProgress => "In Progress",
        }
    }
}

impl std::fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database model for a support case
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Case {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub solution_details: Option<String>,
    pub reported_by: String,
    pub reported_by_user_id: Option<Uuid>,
    pub status: CaseStatus,
    pub severity: Option<Severity>,
    pub assigned_by_user_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Build a freshly reported case: Open, no severity, no due date
    pub fn new(data: NewCase, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            solution_details: None,
            reported_by: data.reported_by,
            reported_by_user_id: data.reported_by_user_id,
            status: CaseStatus::Open,
            severity: None,
            assigned_by_user_id: None,
            due_date: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sla_status(&self, now: DateTime<Utc>) -> SlaStatus {
        compute_sla_status(self.status, self.due_date, self.resolved_at, now)
    }

    /// Apply a status update.
    ///
    /// Entering `Resolved` stamps `resolved_at` once; staying `Resolved` keeps the
    /// original stamp; leaving `Resolved` clears it.
    pub fn apply_status_change(&mut self, change: &StatusChange, now: DateTime<Utc>) {
        self.resolved_at = match (change.status.is_resolved(), self.resolved_at) {
            (true, Some(existing)) => Some(existing),
            (true, None) => Some(now),
            (false, _) => None,
        };
        self.status = change.status;
        if let Some(details) = &change.solution_details {
            self.solution_details = Some(details.clone());
        }
        self.updated_at = now;
    }

    /// (Re)assign severity, discarding any previous due date
    pub fn assign_severity(&mut self, assignment: &SeverityAssignment, now: DateTime<Utc>) {
        self.severity = Some(assignment.severity);
        self.due_date = Some(compute_due_date(assignment.severity, now));
        self.assigned_by_user_id = Some(assignment.assigned_by);
        self.updated_at = now;
    }
}

/// Data for reporting a new case
#[derive(Debug, Clone)]
pub struct NewCase {
    pub title: String,
    pub description: String,
    pub reported_by: String,
    pub reported_by_user_id: Option<Uuid>,
}

/// Status transition requested by any authenticated user
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: CaseStatus,
    pub solution_details: Option<String>,
}

/// Severity assignment requested by an admin
#[derive(Debug, Clone)]
pub struct SeverityAssignment {
    pub severity: Severity,
    pub assigned_by: Uuid,
}
