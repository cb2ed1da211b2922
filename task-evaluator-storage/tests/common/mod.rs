#![allow(dead_code)]

use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::Fake;
use task_evaluator_core::domain::{Payment, Report, Task, TaskSubmission, UserId};
use task_evaluator_core::EvaluationResult;

pub fn create_test_task(owner: UserId) -> Task {
    TaskSubmission::new(
        Sentence(2..5).fake::<String>(),
        Paragraph(1..3).fake::<String>(),
        format!("fn {}() {{}}", Word().fake::<String>()),
    )
    .with_language("rust")
    .into_task(owner)
    .expect("fixture submission is valid")
}

pub fn create_test_evaluation() -> EvaluationResult {
    EvaluationResult {
        score: Some((0..=100).fake()),
        strengths: vec![Sentence(2..4).fake()],
        improvements: vec![Sentence(2..4).fake(), Sentence(2..4).fake()],
        short_feedback: Sentence(3..6).fake(),
        full_report: Paragraph(2..4).fake(),
    }
}

pub fn create_test_report(task: &Task) -> Report {
    Report::from_evaluation(task, create_test_evaluation())
}

pub fn create_test_checkout_payment(report: &Report, session_id: &str) -> Payment {
    Payment::from_checkout(
        report.id,
        Some(report.user_id),
        session_id,
        Some(format!("pi_{}", Word().fake::<String>())),
        499,
        "usd",
    )
}
