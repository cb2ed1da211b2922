use serde::{Deserialize, Serialize};

/// Body of `POST /run-evaluation`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunEvaluationRequest {
    #[serde(default, alias = "taskId")]
    pub task_id: Option<String>,
}
