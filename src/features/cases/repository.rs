use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::cases::models::{Case, NewCase, SeverityAssignment, StatusChange};

/// Persistence operations the case service relies on.
///
/// Each mutating call is an atomic read-modify-write of a single row and returns
/// `None` when the case does not exist.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Case>>;

    /// Newest first, with the total row count
    async fn list_page(&self, offset: i64, limit: i64) -> Result<(Vec<Case>, i64)>;

    async fn list_all(&self) -> Result<Vec<Case>>;

    async fn insert(&self, data: NewCase, now: DateTime<Utc>) -> Result<Case>;

    async fn update_status(
        &self,
        id: Uuid,
        change: &StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>>;

    async fn assign_severity(
        &self,
        id: Uuid,
        assignment: &SeverityAssignment,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>>;
}

const CASE_COLUMNS: &str = r#"
    id, title, description, solution_details, reported_by, reported_by_user_id,
    status, severity, assigned_by_user_id, due_date, resolved_at,
    created_at, updated_at
"#;

/// A foreign-key failure means the acting account was deleted mid-request
fn write_error(action: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_foreign_key_violation() {
            tracing::info!("Rejected {}: acting account no longer exists", action);
            return AppError::Unauthorized("Account no longer exists".to_string());
        }
    }

    tracing::error!("Failed to {}: {:?}", action, e);
    AppError::Database(e)
}

/// PostgreSQL-backed case storage
pub struct PgCaseRepository {
    pool: PgPool,
}

impl PgCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Case>> {
        let query = format!("SELECT {} FROM cases WHERE id = $1 FOR UPDATE", CASE_COLUMNS);
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock case {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn write_back(tx: &mut Transaction<'_, Postgres>, case: &Case) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE cases
            SET
                status = $2,
                solution_details = $3,
                severity = $4,
                assigned_by_user_id = $5,
                due_date = $6,
                resolved_at = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(case.id)
        .bind(case.status)
        .bind(&case.solution_details)
        .bind(case.severity)
        .bind(case.assigned_by_user_id)
        .bind(case.due_date)
        .bind(case.resolved_at)
        .bind(case.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| write_error("update case", e))?;

        Ok(())
    }

    /// Lock the row, apply `mutate`, persist the result and commit
    async fn modify<F>(&self, id: Uuid, mutate: F) -> Result<Option<Case>>
    where
        F: FnOnce(&mut Case) + Send,
    {
        let mut tx = self.pool.begin().await?;

        let Some(mut case) = Self::lock_for_update(&mut tx, id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        mutate(&mut case);
        Self::write_back(&mut tx, &case).await?;
        tx.commit().await?;

        Ok(Some(case))
    }
}

#[async_trait]
impl CaseRepository for PgCaseRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Case>> {
        let query = format!("SELECT {} FROM cases WHERE id = $1", CASE_COLUMNS);
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get case by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_page(&self, offset: i64, limit: i64) -> Result<(Vec<Case>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cases")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count cases: {:?}", e);
                AppError::Database(e)
            })?;

        let query = format!(
            "SELECT {} FROM cases ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2",
            CASE_COLUMNS
        );
        let cases = sqlx::query_as::<_, Case>(&query)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list cases: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((cases, total))
    }

    async fn list_all(&self) -> Result<Vec<Case>> {
        let query = format!(
            "SELECT {} FROM cases ORDER BY created_at DESC, id DESC",
            CASE_COLUMNS
        );
        sqlx::query_as::<_, Case>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list all cases: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn insert(&self, data: NewCase, now: DateTime<Utc>) -> Result<Case> {
        let case = Case::new(data, now);

        let query = format!(
            r#"
            INSERT INTO cases (
                id, title, description, reported_by, reported_by_user_id,
                status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CASE_COLUMNS
        );

        sqlx::query_as::<_, Case>(&query)
            .bind(case.id)
            .bind(&case.title)
            .bind(&case.description)
            .bind(&case.reported_by)
            .bind(case.reported_by_user_id)
            .bind(case.status)
            .bind(case.created_at)
            .bind(case.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error("create case", e))
    }

    async fn update_status(
        &self,
        id: Uuid,
        change: &StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>> {
        self.modify(id, |case| case.apply_status_change(change, now))
            .await
    }

    async fn assign_severity(
        &self,
        id: Uuid,
        assignment: &SeverityAssignment,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>> {
        self.modify(id, |case| case.assign_severity(assignment, now))
            .await
    }
}
