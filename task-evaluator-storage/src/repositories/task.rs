use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use task_evaluator_core::domain::{Task, TaskId, TaskStatus, UserId};
use task_evaluator_core::{Result, TaskRepository};
use uuid::Uuid;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, code, language, status, created_at";

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: PgRow) -> Result<Task> {
        let id: Uuid = row.try_get("id")?;
        let user_id: Uuid = row.try_get("user_id")?;
        let status: String = row.try_get("status")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(Task {
            id: TaskId(id),
            user_id: UserId(user_id),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            code: row.try_get("code")?,
            language: row.try_get("language")?,
            status: status.parse()?,
            created_at,
        })
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: &Task) -> Result<Task> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tasks (id, user_id, title, description, code, language, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id.0)
        .bind(task.user_id.0)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.code)
        .bind(&task.language)
        .bind(task.status.as_str())
        .bind(task.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_task(row)
    }

    async fn get_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_task).transpose()
    }

    async fn list_for_owner(&self, owner_id: &UserId, limit: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(owner_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_task).collect()
    }

    async fn list_by_status(&self, status: TaskStatus, limit: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#
        ))
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_task).collect()
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        sqlx::query("UPDATE tasks SET status = $2 WHERE id = $1")
            .bind(id.0)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
