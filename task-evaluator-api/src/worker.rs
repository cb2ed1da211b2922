//! Background consumer of [`EvaluationJob`]s.
//!
//! The model is asked once per job. Storage steps are retried with
//! exponential backoff; a job that exhausts its attempts is written to the
//! dead-letter table. Its task is marked `error` unless a report was stored.

use std::sync::Arc;
use task_evaluator_core::domain::{DeadLetter, Report, TaskId, TaskStatus};
use task_evaluator_core::evaluation::EvaluationResult;
use task_evaluator_core::{CoreError, DeadLetterRepository, TaskRepository};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::observability::EvaluatorMetrics;
use crate::queue::EvaluationJob;
use crate::services::EvaluationService;
use crate::settings::QueueSettings;

/// What a job has already achieved, so retries resume instead of repeating.
#[derive(Default)]
struct Progress {
    result: Option<EvaluationResult>,
    report: Option<Report>,
}

#[derive(Debug, PartialEq, Eq)]
enum Processed {
    Stored,
    Skipped(&'static str),
}

pub struct EvaluationWorker {
    receiver: mpsc::Receiver<EvaluationJob>,
    tasks: Arc<dyn TaskRepository>,
    dead_letters: Arc<dyn DeadLetterRepository>,
    service: EvaluationService,
    settings: QueueSettings,
    cancel: CancellationToken,
}

impl EvaluationWorker {
    pub fn new(
        receiver: mpsc::Receiver<EvaluationJob>,
        tasks: Arc<dyn TaskRepository>,
        dead_letters: Arc<dyn DeadLetterRepository>,
        service: EvaluationService,
        settings: QueueSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            tasks,
            dead_letters,
            service,
            settings,
            cancel,
        }
    }

    /// Consumes jobs until cancelled or until every queue handle is dropped.
    /// The job in flight when cancellation arrives is finished first.
    pub async fn run(mut self) {
        tracing::info!("evaluation worker started");
        loop {
            let job = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };
            self.process(job).await;
        }
        tracing::info!("evaluation worker stopped");
    }

    #[tracing::instrument(skip(self), fields(task_id = %job.task_id))]
    async fn process(&self, job: EvaluationJob) {
        let mut progress = Progress::default();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.try_process(job.task_id, &mut progress).await {
                Ok(Processed::Stored) => return,
                Ok(Processed::Skipped(reason)) => {
                    tracing::debug!(reason, "evaluation job skipped");
                    return;
                }
                Err(err) => err,
            };

            if attempt >= self.settings.max_attempts {
                self.dead_letter(job.task_id, &err, attempt, progress.report.is_some())
                    .await;
                return;
            }

            let delay = self.settings.backoff(attempt);
            tracing::warn!(attempt, ?delay, error = %err, "evaluation step failed; retrying");
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("shutdown during retry backoff; task will be recovered on restart");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn try_process(
        &self,
        task_id: TaskId,
        progress: &mut Progress,
    ) -> Result<Processed, CoreError> {
        let Some(task) = self.tasks.get_by_id(&task_id).await? else {
            return Ok(Processed::Skipped("task no longer exists"));
        };
        if progress.report.is_none() && task.status.is_terminal() {
            return Ok(Processed::Skipped("task already evaluated"));
        }

        if progress.report.is_none() && self.service.has_report(&task).await? {
            // Stored by `/run-evaluation` or by a run interrupted before `done`.
            self.service.set_status(&task, TaskStatus::Done).await?;
            return Ok(Processed::Skipped("report already stored"));
        }

        if progress.report.is_none() {
            if task.status != TaskStatus::InReview {
                self.service.set_status(&task, TaskStatus::InReview).await?;
            }

            let result = match &progress.result {
                Some(result) => result.clone(),
                None => {
                    let result = self.service.evaluate(&task).await;
                    progress.result = Some(result.clone());
                    result
                }
            };

            progress.report = Some(self.service.store_report(&task, result).await?);
        }

        self.service.set_status(&task, TaskStatus::Done).await?;
        if let Some(report) = &progress.report {
            tracing::info!(report_id = %report.id, "evaluation stored");
        }
        Ok(Processed::Stored)
    }

    async fn dead_letter(
        &self,
        task_id: TaskId,
        err: &CoreError,
        attempts: u32,
        report_stored: bool,
    ) {
        tracing::error!(attempts, error = %err, "evaluation job exhausted its retries");
        EvaluatorMetrics::dead_letter();

        if let Err(record_err) = self
            .dead_letters
            .record(&DeadLetter::new(task_id, err.to_string(), attempts))
            .await
        {
            tracing::error!(error = %record_err, "failed to write dead letter");
        }
        if report_stored {
            tracing::warn!("report is stored; leaving status for the recovery sweep");
            return;
        }
        if let Err(status_err) = self.tasks.update_status(&task_id, TaskStatus::Error).await {
            tracing::error!(error = %status_err, "failed to mark task as errored");
        }
    }
}
