use axum::{
    extract::{Path, Query, State},
    Json,
};
use task_evaluator_core::domain::ReportId;
use validator::Validate;

use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    AppState,
};

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ReportListResponse>> {
    query.validate()?;

    let reports = state
        .reports
        .list_for_owner(&user.user_id, query.limit())
        .await?;

    Ok(Json(ReportListResponse {
        reports: reports.into_iter().map(ReportResponse::from).collect(),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ReportEnvelope>> {
    let not_found = || ApiError::NotFound("Report not found".to_string());
    let id: ReportId = id.parse().map_err(|_| not_found())?;

    let report = state
        .reports
        .get_for_owner(&id, &user.user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ReportEnvelope {
        report: report.into(),
    }))
}
