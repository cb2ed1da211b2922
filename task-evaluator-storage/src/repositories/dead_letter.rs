use async_trait::async_trait;
use sqlx::PgPool;
use task_evaluator_core::domain::DeadLetter;
use task_evaluator_core::{DeadLetterRepository, Result};

pub struct PgDeadLetterRepository {
    pool: PgPool,
}

impl PgDeadLetterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeadLetterRepository for PgDeadLetterRepository {
    async fn record(&self, letter: &DeadLetter) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO evaluation_dead_letters (task_id, error, attempts, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(letter.task_id.0)
        .bind(&letter.error)
        .bind(i32::try_from(letter.attempts).unwrap_or(i32::MAX))
        .bind(letter.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
