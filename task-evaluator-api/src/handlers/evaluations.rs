use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use task_evaluator_core::domain::{TaskId, TaskStatus};

use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    AppState,
};

/// `POST /run-evaluation`: evaluates one of the caller's tasks synchronously.
pub async fn run(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<RunEvaluationRequest>, JsonRejection>,
) -> ApiResult<Json<ReportEnvelope>> {
    if !state.evaluations.model_configured() {
        return Err(ApiError::Misconfigured(
            "Model API key is not configured. Set model.api_key.".to_string(),
        ));
    }

    let Json(payload) = payload?;
    let raw_id = payload
        .task_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing task_id".to_string()))?;

    let not_found = || ApiError::NotFound("Task not found".to_string());
    let task_id: TaskId = raw_id.parse().map_err(|_| not_found())?;
    let task = state.tasks.get_by_id(&task_id).await?.ok_or_else(not_found)?;

    if !task.is_owned_by(&user.user_id) {
        tracing::warn!(task_id = %task.id, "evaluation requested by non-owner");
        return Err(ApiError::Unauthorized);
    }
    if task.status == TaskStatus::InReview {
        return Err(ApiError::Conflict("Evaluation already in progress".to_string()));
    }

    let report = state.evaluations.run(&task).await?;
    Ok(Json(ReportEnvelope {
        report: report.into(),
    }))
}
