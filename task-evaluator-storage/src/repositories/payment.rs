use async_trait::async_trait;
use sqlx::PgPool;
use task_evaluator_core::domain::{Payment, UnlockOutcome};
use task_evaluator_core::{PaymentRepository, Result};

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn record_and_unlock(&self, payment: &Payment) -> Result<UnlockOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent unlocks of the same report.
        let was_unlocked: Option<bool> =
            sqlx::query_scalar("SELECT unlocked FROM reports WHERE id = $1 FOR UPDATE")
                .bind(payment.report_id.0)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(was_unlocked) = was_unlocked else {
            tx.rollback().await?;
            return Ok(UnlockOutcome::ReportNotFound);
        };

        if was_unlocked && payment.is_mock() {
            tx.rollback().await?;
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, report_id, stripe_session_id, stripe_payment_id,
                amount, currency, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (stripe_session_id) DO NOTHING
            "#,
        )
        .bind(payment.id.0)
        .bind(payment.user_id.map(|id| id.0))
        .bind(payment.report_id.0)
        .bind(&payment.stripe_session_id)
        .bind(&payment.stripe_payment_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tracing::debug!(
                session_id = ?payment.stripe_session_id,
                "payment for this session already recorded"
            );
        }

        sqlx::query("UPDATE reports SET unlocked = true WHERE id = $1")
            .bind(payment.report_id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(if was_unlocked {
            UnlockOutcome::AlreadyUnlocked
        } else {
            UnlockOutcome::Unlocked
        })
    }
}
