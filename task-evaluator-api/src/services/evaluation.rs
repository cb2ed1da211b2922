use std::sync::Arc;
use task_evaluator_core::domain::{Report, Task, TaskStatus};
use task_evaluator_core::evaluation::{EvaluationPrompt, EvaluationResult};
use task_evaluator_core::{ReportRepository, Result, TaskRepository};

use crate::clients::ModelClient;
use crate::observability::EvaluatorMetrics;
use crate::settings::{Integration, ModelSettings};

const MODEL_UNCONFIGURED: &str = "model API key is not configured";

/// A model client together with the request parameters it is called with.
#[derive(Clone)]
pub struct ModelBinding {
    pub client: Arc<dyn ModelClient>,
    pub model: String,
    pub max_output_tokens: u32,
}

impl ModelBinding {
    pub fn new(client: Arc<dyn ModelClient>, settings: &ModelSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

/// Runs one task through the model and persists the resulting report.
#[derive(Clone)]
pub struct EvaluationService {
    tasks: Arc<dyn TaskRepository>,
    reports: Arc<dyn ReportRepository>,
    model: Integration<ModelBinding>,
}

impl EvaluationService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        reports: Arc<dyn ReportRepository>,
        model: Integration<ModelBinding>,
    ) -> Self {
        Self {
            tasks,
            reports,
            model,
        }
    }

    pub fn model_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Asks the model for an evaluation. Never fails: an unreachable or
    /// unconfigured model yields the labelled mock result.
    #[tracing::instrument(skip_all, fields(task_id = %task.id))]
    pub async fn evaluate(&self, task: &Task) -> EvaluationResult {
        let Some(binding) = self.model.settings() else {
            tracing::warn!("{}; using mock evaluation", MODEL_UNCONFIGURED);
            return EvaluationResult::mock(MODEL_UNCONFIGURED);
        };

        let prompt = EvaluationPrompt::for_task(task, &binding.model, binding.max_output_tokens);
        match binding.client.complete(&prompt).await {
            Ok(completion) => EvaluationResult::from_completion(&completion),
            Err(err) => {
                tracing::warn!(error = %err, "model call failed; using mock evaluation");
                EvaluationResult::mock(&err.to_string())
            }
        }
    }

    /// Inserts the report for `result`. The task status is left untouched.
    pub async fn store_report(&self, task: &Task, result: EvaluationResult) -> Result<Report> {
        let source = if result.is_mock() { "mock" } else { "model" };
        let report = self
            .reports
            .create(&Report::from_evaluation(task, result))
            .await?;
        EvaluatorMetrics::evaluation_completed(source);
        Ok(report)
    }

    pub async fn has_report(&self, task: &Task) -> Result<bool> {
        self.reports.exists_for_task(&task.id).await
    }

    pub async fn set_status(&self, task: &Task, status: TaskStatus) -> Result<()> {
        self.tasks.update_status(&task.id, status).await
    }

    /// The synchronous path: `in_review`, evaluate, insert report, `done`.
    /// A failed report insert marks the task `error` and is returned.
    #[tracing::instrument(skip_all, fields(task_id = %task.id))]
    pub async fn run(&self, task: &Task) -> Result<Report> {
        self.set_status(task, TaskStatus::InReview).await?;

        let result = self.evaluate(task).await;
        let report = match self.store_report(task, result).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "failed to insert report");
                if let Err(status_err) = self.set_status(task, TaskStatus::Error).await {
                    tracing::warn!(error = %status_err, "failed to mark task as errored");
                }
                return Err(err);
            }
        };

        self.set_status(task, TaskStatus::Done).await?;
        tracing::info!(report_id = %report.id, score = ?report.score, "evaluation stored");
        Ok(report)
    }
}
