use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task_evaluator_core::domain::Report;
use uuid::Uuid;

/// A report as the caller may see it: `full_report` is omitted while locked.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub score: Option<i32>,
    pub short_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_report: Option<String>,
    pub unlocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        let full_report = report.visible_full_report().map(str::to_string);
        Self {
            id: report.id.0,
            task_id: report.task_id.0,
            user_id: report.user_id.0,
            score: report.score,
            short_feedback: report.short_feedback,
            strengths: report.strengths,
            improvements: report.improvements,
            full_report,
            unlocked: report.unlocked,
            created_at: report.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub report: ReportResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportResponse>,
}
