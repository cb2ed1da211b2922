use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{TaskId, UserId};
use crate::error::{CoreError, Result};

/// Language tag stored when the submitter does not name one.
pub const UNSPECIFIED_LANGUAGE: &str = "unspecified";

// ===== Task Status =====

/// Evaluation progress of a task, polled by clients.
///
/// `Pending -> InReview -> Done | Error`. A task may also go straight from
/// `Pending` to `Error` when its job is dead-lettered before a model call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InReview,
    Done,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InReview => "in_review",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_review" => Ok(TaskStatus::InReview),
            "done" => Ok(TaskStatus::Done),
            "error" => Ok(TaskStatus::Error),
            other => Err(CoreError::Validation(format!("unknown task status: {}", other))),
        }
    }
}

// ===== Task =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub code: String,
    pub language: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }
}

/// Client-supplied task fields before validation.
///
/// There is deliberately no owner field: the owner always comes from the
/// authenticated caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSubmission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
}

impl TaskSubmission {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            code: Some(code.into()),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Validates the submission and builds a pending task owned by `owner`.
    pub fn into_task(self, owner: UserId) -> Result<Task> {
        let (title, description, code) = match (
            non_blank(self.title),
            non_blank(self.description),
            non_blank(self.code),
        ) {
            (Some(title), Some(description), Some(code)) => (title, description, code),
            _ => {
                return Err(CoreError::Validation(
                    "Title, description, and code are required.".to_string(),
                ))
            }
        };

        Ok(Task {
            id: TaskId::new(),
            user_id: owner,
            title,
            description,
            code,
            language: normalize_language(self.language.as_deref()),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trims and lowercases a language tag, defaulting to [`UNSPECIFIED_LANGUAGE`].
pub fn normalize_language(language: Option<&str>) -> String {
    match language.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.to_lowercase(),
        _ => UNSPECIFIED_LANGUAGE.to_string(),
    }
}
