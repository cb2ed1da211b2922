use task_evaluator_core::domain::*;
use task_evaluator_core::{CoreError, EvaluationResult};
use uuid::Uuid;

// ===== ID Tests =====

#[test]
fn test_task_id_conversions() {
    let uuid = Uuid::new_v4();
    let id = TaskId::from_uuid(uuid);

    assert_eq!(id.as_uuid(), &uuid);

    let id2: TaskId = uuid.into();
    assert_eq!(id, id2);

    let uuid2: Uuid = id.into();
    assert_eq!(uuid, uuid2);
}

#[test]
fn test_report_id_parses_from_str() {
    let uuid = Uuid::new_v4();
    let parsed: ReportId = format!(" {} ", uuid).parse().unwrap();

    assert_eq!(parsed, ReportId::from_uuid(uuid));
    assert!("not-a-uuid".parse::<ReportId>().is_err());
}

#[test]
fn test_ids_serialize_transparently() {
    let id = UserId::new();
    let json = serde_json::to_string(&id).unwrap();

    assert_eq!(json, format!("\"{}\"", id));
}

// ===== Task Submission Tests =====

#[test]
fn test_submission_without_language_is_unspecified() {
    let owner = UserId::new();
    let task = TaskSubmission::new("Two sum", "Find two numbers", "fn main() {}")
        .into_task(owner)
        .unwrap();

    assert_eq!(task.language, UNSPECIFIED_LANGUAGE);
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.user_id, owner);
}

#[test]
fn test_submission_language_is_trimmed_and_lowercased() {
    let task = TaskSubmission::new("t", "d", "c")
        .with_language("  TypeScript ")
        .into_task(UserId::new())
        .unwrap();

    assert_eq!(task.language, "typescript");
}

#[test]
fn test_submission_requires_every_field() {
    let blank_code = TaskSubmission::new("t", "d", "   ");
    let missing_title = TaskSubmission {
        title: None,
        ..TaskSubmission::new("t", "d", "c")
    };

    for submission in [blank_code, missing_title] {
        match submission.into_task(UserId::new()) {
            Err(CoreError::Validation(message)) => {
                assert_eq!(message, "Title, description, and code are required.")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

#[test]
fn test_task_status_serializes_snake_case() {
    let json = serde_json::to_string(&TaskStatus::InReview).unwrap();
    assert_eq!(json, "\"in_review\"");
    assert!(TaskStatus::Done.is_terminal());
    assert!(!TaskStatus::InReview.is_terminal());
}

// ===== Report Tests =====

#[test]
fn test_report_from_evaluation_is_locked_and_owned_by_task_owner() {
    let task = TaskSubmission::new("t", "d", "c").into_task(UserId::new()).unwrap();
    let report = Report::from_evaluation(&task, EvaluationResult::invalid("raw"));

    assert!(report.is_locked());
    assert_eq!(report.task_id, task.id);
    assert!(report.is_owned_by(&task.user_id));
    assert_eq!(report.visible_full_report(), None);
}

#[test]
fn test_unlocked_report_shows_full_text() {
    let task = TaskSubmission::new("t", "d", "c").into_task(UserId::new()).unwrap();
    let mut report = Report::from_evaluation(&task, EvaluationResult::mock("offline"));
    report.unlocked = true;

    assert!(report.visible_full_report().unwrap().contains("offline"));
}

// ===== Payment Tests =====

#[test]
fn test_mock_payment_shape() {
    let report_id = ReportId::new();
    let user_id = UserId::new();
    let payment = Payment::mock(report_id, user_id);

    assert!(payment.is_mock());
    assert_eq!(payment.amount, 0);
    assert_eq!(payment.currency, MOCK_CURRENCY);
    assert_eq!(payment.status, PaymentStatus::Succeeded);
    assert_eq!(payment.user_id, Some(user_id));
}

#[test]
fn test_checkout_payment_shape() {
    let payment = Payment::from_checkout(
        ReportId::new(),
        None,
        "cs_test_123",
        Some("pi_456".to_string()),
        499,
        "usd",
    );

    assert!(!payment.is_mock());
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.stripe_session_id.as_deref(), Some("cs_test_123"));
    assert_eq!("completed".parse::<PaymentStatus>().unwrap(), PaymentStatus::Completed);
}

#[test]
fn test_dead_letter_records_attempts() {
    let task_id = TaskId::new();
    let letter = DeadLetter::new(task_id, "database unavailable", 3);

    assert_eq!(letter.task_id, task_id);
    assert_eq!(letter.attempts, 3);
}
