//! SLA rules for support cases.
//!
//! Both functions are pure: the caller supplies "now", so results depend only on
//! their arguments. The SLA label is recomputed on every read and never stored.

use chrono::{DateTime, Duration, Utc};

use crate::features::cases::models::{CaseStatus, Severity, SlaStatus};

/// Days allowed for labels outside the severity vocabulary (same as Minor)
pub const FALLBACK_RESOLUTION_DAYS: i64 = 7;

impl Severity {
    /// Resolution window granted to this severity
    pub fn resolution_days(&self) -> i64 {
        match self {
            Severity::Critical => 1,
            Severity::Major => 3,
            Severity::Minor => 7,
        }
    }
}

/// Due date for a severity assigned at `assigned_at`
pub fn compute_due_date(severity: Severity, assigned_at: DateTime<Utc>) -> DateTime<Utc> {
    assigned_at + Duration::days(severity.resolution_days())
}

/// Due date for a raw severity label; unknown labels get the fallback window
#[allow(dead_code)]
pub fn compute_due_date_for_label(label: &str, assigned_at: DateTime<Utc>) -> DateTime<Utc> {
    match label.parse::<Severity>() {
        Ok(severity) => compute_due_date(severity, assigned_at),
        Err(_) => assigned_at + Duration::days(FALLBACK_RESOLUTION_DAYS),
    }
}

/// SLA label for a case at `now`. First matching rule wins:
///
/// 1. no due date: `Pending Assignment`
/// 2. resolved: `Met SLA` when `resolved_at <= due_date` (or no resolution stamp),
///    otherwise `Breached SLA`
/// 3. open: `OVERDUE` when `now > due_date`, otherwise `In Progress`
pub fn compute_sla_status(
    status: CaseStatus,
    due_date: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SlaStatus {
    let Some(due_date) = due_date else {
        return SlaStatus::PendingAssignment;
    };

    if status.is_resolved() {
        return match resolved_at {
            Some(resolved_at) if resolved_at <= due_date => SlaStatus::Met,
            Some(_) => SlaStatus::Breached,
            // Resolved without a stamp is treated leniently
            None => SlaStatus::Met,
        };
    }

    if now > due_date {
        SlaStatus::Overdue
    } else {
        SlaStatus::InProgress
    }
}
