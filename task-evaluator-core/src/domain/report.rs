use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ReportId, TaskId, UserId};
use super::task::Task;
use crate::evaluation::EvaluationResult;

/// Persisted outcome of evaluating a task.
///
/// `unlocked` is the only field that changes after creation, and it only ever
/// goes from `false` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: ReportId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub score: Option<i32>,
    pub short_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub full_report: String,
    pub unlocked: bool,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Projects an evaluation into a locked report owned by the task's owner.
    pub fn from_evaluation(task: &Task, result: EvaluationResult) -> Self {
        Self {
            id: ReportId::new(),
            task_id: task.id,
            user_id: task.user_id,
            score: result.score,
            short_feedback: result.short_feedback,
            strengths: result.strengths,
            improvements: result.improvements,
            full_report: result.full_report,
            unlocked: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.unlocked
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// The full report text, only once the report has been unlocked.
    pub fn visible_full_report(&self) -> Option<&str> {
        self.unlocked.then_some(self.full_report.as_str())
    }
}
