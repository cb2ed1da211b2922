//! Postgres repository tests against a throwaway container.
//!
//! ```sh
//! cargo test -p task-evaluator-storage --test postgres_tests --features integration-tests
//! ```

#![cfg(feature = "integration-tests")]

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use task_evaluator_core::domain::{
    DeadLetter, Payment, Report, ReportId, Task, TaskStatus, UnlockOutcome, UserId,
};
use task_evaluator_core::{
    CoreError, DeadLetterRepository, PaymentRepository, ReportRepository, TaskRepository,
};
use task_evaluator_storage::postgres::{create_pool, migrate, PostgresConfig};
use task_evaluator_storage::{
    PgDeadLetterRepository, PgPaymentRepository, PgReportRepository, PgTaskRepository,
    SchemaCapabilities,
};
use testcontainers_modules::postgres::Postgres;
use testcontainers::{runners::AsyncRunner, ContainerAsync};

struct Database {
    // Dropping the container stops it.
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    tasks: PgTaskRepository,
    reports: PgReportRepository,
    payments: PgPaymentRepository,
}

/// Start PostgreSQL, apply the migrations and build the repositories.
async fn setup_postgres() -> Database {
    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start postgres container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    let config = PostgresConfig::new(format!(
        "postgres://postgres:postgres@{}:{}/postgres",
        host, port
    ));
    let pool = create_pool(&config).await.expect("Failed to create pool");
    migrate(&pool).await.expect("Failed to run migrations");

    Database {
        _container: container,
        tasks: PgTaskRepository::new(pool.clone()),
        reports: PgReportRepository::new(pool.clone()),
        payments: PgPaymentRepository::new(pool.clone()),
        pool,
    }
}

impl Database {
    async fn seed_report(&self) -> (Task, Report) {
        let task = self
            .tasks
            .create(&create_test_task(UserId::new()))
            .await
            .expect("task insert");
        let report = self
            .reports
            .create(&create_test_report(&task))
            .await
            .expect("report insert");
        (task, report)
    }

    async fn payment_count(&self, report_id: ReportId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE report_id = $1")
            .bind(report_id.0)
            .fetch_one(&self.pool)
            .await
            .expect("count payments")
    }

    async fn is_unlocked(&self, report: &Report) -> bool {
        self.reports
            .get_for_owner(&report.id, &report.user_id)
            .await
            .expect("report lookup")
            .expect("report exists")
            .unlocked
    }
}

// ===== Schema =====

#[tokio::test]
async fn test_migrated_schema_is_current() {
    let db = setup_postgres().await;

    let caps = SchemaCapabilities::probe(&db.pool).await.unwrap();

    assert!(caps.missing().is_empty());
    assert!(caps.require_current().is_ok());
}

#[tokio::test]
async fn test_dropped_column_requires_migration() {
    let db = setup_postgres().await;
    sqlx::query("ALTER TABLE tasks DROP COLUMN language")
        .execute(&db.pool)
        .await
        .unwrap();

    let caps = SchemaCapabilities::probe(&db.pool).await.unwrap();
    assert!(!caps.has_column("tasks", "language"));
    assert!(matches!(
        caps.require_current(),
        Err(CoreError::MigrationRequired { .. })
    ));

    // An insert that reaches the database anyway maps SQLSTATE 42703.
    let err = db
        .tasks
        .create(&create_test_task(UserId::new()))
        .await
        .unwrap_err();
    match err {
        CoreError::MigrationRequired { table, column } => {
            assert_eq!(table, "tasks");
            assert_eq!(column, "language");
        }
        other => panic!("expected MigrationRequired, got {other:?}"),
    }
}

// ===== Tasks and Reports =====

#[tokio::test]
async fn test_task_status_round_trip() {
    let db = setup_postgres().await;
    let owner = UserId::new();
    let task = db.tasks.create(&create_test_task(owner)).await.unwrap();

    db.tasks
        .update_status(&task.id, TaskStatus::InReview)
        .await
        .unwrap();

    let stored = db.tasks.get_by_id(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::InReview);
    assert_eq!(stored.language, "rust");
    let in_review = db
        .tasks
        .list_by_status(TaskStatus::InReview, 10)
        .await
        .unwrap();
    assert_eq!(in_review.len(), 1);
    assert!(TaskRepository::list_for_owner(&db.tasks, &UserId::new(), 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_reports_are_owner_scoped() {
    let db = setup_postgres().await;
    let (task, report) = db.seed_report().await;

    assert!(db
        .reports
        .get_for_owner(&report.id, &UserId::new())
        .await
        .unwrap()
        .is_none());
    let stored = db
        .reports
        .get_for_owner(&report.id, &report.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.strengths, report.strengths);
    assert!(!stored.unlocked);
    assert!(db.reports.exists_for_task(&task.id).await.unwrap());
}

// ===== Unlock Transaction =====

#[tokio::test]
async fn test_checkout_payment_unlocks_report() {
    let db = setup_postgres().await;
    let (_, report) = db.seed_report().await;

    let outcome = db
        .payments
        .record_and_unlock(&create_test_checkout_payment(&report, "cs_first"))
        .await
        .unwrap();

    assert_eq!(outcome, UnlockOutcome::Unlocked);
    assert!(db.is_unlocked(&report).await);
    assert_eq!(db.payment_count(report.id).await, 1);
}

#[tokio::test]
async fn test_webhook_redelivery_is_idempotent() {
    let db = setup_postgres().await;
    let (_, report) = db.seed_report().await;
    let payment = create_test_checkout_payment(&report, "cs_redelivered");

    let first = db.payments.record_and_unlock(&payment).await.unwrap();
    // A redelivered event builds a fresh payment id for the same session.
    let again = create_test_checkout_payment(&report, "cs_redelivered");
    let second = db.payments.record_and_unlock(&again).await.unwrap();

    assert_eq!(first, UnlockOutcome::Unlocked);
    assert_eq!(second, UnlockOutcome::AlreadyUnlocked);
    assert!(db.is_unlocked(&report).await);
    assert_eq!(db.payment_count(report.id).await, 1);
}

#[tokio::test]
async fn test_mock_payment_on_unlocked_report_rolls_back() {
    let db = setup_postgres().await;
    let (_, report) = db.seed_report().await;
    db.payments
        .record_and_unlock(&Payment::mock(report.id, report.user_id))
        .await
        .unwrap();

    let outcome = db
        .payments
        .record_and_unlock(&Payment::mock(report.id, report.user_id))
        .await
        .unwrap();

    assert_eq!(outcome, UnlockOutcome::AlreadyUnlocked);
    assert_eq!(db.payment_count(report.id).await, 1);
}

#[tokio::test]
async fn test_unlock_of_missing_report() {
    let db = setup_postgres().await;

    let outcome = db
        .payments
        .record_and_unlock(&Payment::mock(ReportId::new(), UserId::new()))
        .await
        .unwrap();

    assert_eq!(outcome, UnlockOutcome::ReportNotFound);
}

#[tokio::test]
async fn test_concurrent_unlocks_record_one_mock_payment() {
    let db = setup_postgres().await;
    let (_, report) = db.seed_report().await;
    let racing = PgPaymentRepository::new(db.pool.clone());

    let left_payment = Payment::mock(report.id, report.user_id);
    let right_payment = Payment::mock(report.id, report.user_id);
    let (left, right) = tokio::join!(
        db.payments.record_and_unlock(&left_payment),
        racing.record_and_unlock(&right_payment),
    );

    let mut outcomes = vec![left.unwrap(), right.unwrap()];
    outcomes.sort_by_key(|outcome| *outcome == UnlockOutcome::Unlocked);
    assert_eq!(
        outcomes,
        vec![UnlockOutcome::AlreadyUnlocked, UnlockOutcome::Unlocked]
    );
    assert_eq!(db.payment_count(report.id).await, 1);
}

#[tokio::test]
async fn test_unlock_cannot_be_reverted() {
    let db = setup_postgres().await;
    let (_, report) = db.seed_report().await;
    db.payments
        .record_and_unlock(&Payment::mock(report.id, report.user_id))
        .await
        .unwrap();

    let err = sqlx::query("UPDATE reports SET unlocked = false WHERE id = $1")
        .bind(report.id.0)
        .execute(&db.pool)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("cannot be reset"));
    assert!(db.is_unlocked(&report).await);
}

// ===== Dead Letters =====

#[tokio::test]
async fn test_dead_letter_is_recorded() {
    let db = setup_postgres().await;
    let (task, _) = db.seed_report().await;
    let dead_letters = PgDeadLetterRepository::new(db.pool.clone());

    dead_letters
        .record(&DeadLetter::new(task.id, "report insert failed", 3))
        .await
        .unwrap();

    let attempts: i32 =
        sqlx::query_scalar("SELECT attempts FROM evaluation_dead_letters WHERE task_id = $1")
            .bind(task.id.0)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(attempts, 3);
}
