use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use task_evaluator_core::domain::{TaskId, TaskSubmission};
use validator::Validate;

use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    observability::EvaluatorMetrics,
    AppState,
};

/// `POST /tasks`: validates, persists and enqueues the task for evaluation.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<CreateTaskResponse>> {
    let Json(payload) = payload?;
    payload.validate()?;

    let task = TaskSubmission::from(payload).into_task(user.user_id)?;
    let task = state.tasks.create(&task).await?;
    EvaluatorMetrics::task_created();
    tracing::info!(task_id = %task.id, language = %task.language, "task created");

    // The task stays pending on failure; the startup sweep picks it up.
    if let Err(err) = state.queue.enqueue(task.id).await {
        tracing::warn!(task_id = %task.id, error = %err, "failed to enqueue evaluation");
    }

    Ok(Json(CreateTaskResponse { task: task.into() }))
}

/// `GET /tasks`: the caller's tasks, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    query.validate()?;

    let tasks = state
        .tasks
        .list_for_owner(&user.user_id, query.limit())
        .await?;

    Ok(Json(TaskListResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
    }))
}

/// `GET /tasks/:id`: one of the caller's tasks, for status polling.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let not_found = || ApiError::NotFound("Task not found".to_string());
    let id: TaskId = id.parse().map_err(|_| not_found())?;

    let task = state
        .tasks
        .get_by_id(&id)
        .await?
        .filter(|task| task.is_owned_by(&user.user_id))
        .ok_or_else(not_found)?;

    Ok(Json(task.into()))
}
