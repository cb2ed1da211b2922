use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// An evaluation job that kept failing after every retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadLetter {
    pub task_id: TaskId,
    pub error: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl DeadLetter {
    pub fn new(task_id: TaskId, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            task_id,
            error: error.into(),
            attempts,
            created_at: Utc::now(),
        }
    }
}
