use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task_evaluator_core::domain::{Task, TaskStatus, TaskSubmission};
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /tasks`. Presence of the required fields is checked by
/// [`TaskSubmission::into_task`]; only length limits live here. Any owner
/// field a client sends is ignored.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(max = 200000))]
    pub code: Option<String>,
    #[validate(length(max = 64))]
    pub language: Option<String>,
}

impl From<CreateTaskRequest> for TaskSubmission {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            code: req.code,
            language: req.language,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub code: String,
    pub language: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.0,
            user_id: task.user_id.0,
            title: task.title,
            description: task.description,
            code: task.code,
            language: task.language,
            status: task.status,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub task: TaskResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
}
