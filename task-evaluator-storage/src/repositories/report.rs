use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use task_evaluator_core::domain::{Report, ReportId, TaskId, UserId};
use task_evaluator_core::{ReportRepository, Result};
use uuid::Uuid;

const REPORT_COLUMNS: &str = "id, task_id, user_id, score, short_feedback, strengths, \
                              improvements, full_report, unlocked, created_at";

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_report(row: PgRow) -> Result<Report> {
        let id: Uuid = row.try_get("id")?;
        let task_id: Uuid = row.try_get("task_id")?;
        let user_id: Uuid = row.try_get("user_id")?;

        Ok(Report {
            id: ReportId(id),
            task_id: TaskId(task_id),
            user_id: UserId(user_id),
            score: row.try_get("score")?,
            short_feedback: row.try_get("short_feedback")?,
            strengths: row.try_get("strengths")?,
            improvements: row.try_get("improvements")?,
            full_report: row.try_get("full_report")?,
            unlocked: row.try_get("unlocked")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(&self, report: &Report) -> Result<Report> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO reports (
                id, task_id, user_id, score, short_feedback, strengths,
                improvements, full_report, unlocked, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.id.0)
        .bind(report.task_id.0)
        .bind(report.user_id.0)
        .bind(report.score)
        .bind(&report.short_feedback)
        .bind(&report.strengths)
        .bind(&report.improvements)
        .bind(&report.full_report)
        .bind(report.unlocked)
        .bind(report.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_report(row)
    }

    async fn get_for_owner(&self, id: &ReportId, owner_id: &UserId) -> Result<Option<Report>> {
        let row = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1 AND user_id = $2"
        ))
        .bind(id.0)
        .bind(owner_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_report).transpose()
    }

    async fn list_for_owner(&self, owner_id: &UserId, limit: i64) -> Result<Vec<Report>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM reports
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(owner_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_report).collect()
    }

    async fn exists_for_task(&self, task_id: &TaskId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reports WHERE task_id = $1)")
                .bind(task_id.0)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
