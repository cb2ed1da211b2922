//! Bounded hand-off between request handlers and the evaluation worker.

use std::time::Duration;
use task_evaluator_core::domain::{TaskId, TaskStatus};
use task_evaluator_core::TaskRepository;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::settings::QueueSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationJob {
    pub task_id: TaskId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("evaluation queue stayed full for {0:?}")]
    Timeout(Duration),
    #[error("evaluation worker has shut down")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct EvaluationQueue {
    sender: mpsc::Sender<EvaluationJob>,
    timeout: Duration,
}

impl EvaluationQueue {
    pub fn new(settings: &QueueSettings) -> (Self, mpsc::Receiver<EvaluationJob>) {
        let (sender, receiver) = mpsc::channel(settings.capacity.max(1));
        (
            Self {
                sender,
                timeout: settings.trigger_timeout(),
            },
            receiver,
        )
    }

    /// Waits at most the trigger timeout for room in the queue.
    pub async fn enqueue(&self, task_id: TaskId) -> Result<(), EnqueueError> {
        self.sender
            .send_timeout(EvaluationJob { task_id }, self.timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => EnqueueError::Timeout(self.timeout),
                SendTimeoutError::Closed(_) => EnqueueError::Closed,
            })
    }
}

/// Re-enqueues tasks a previous process accepted but never finished.
///
/// Delivery is at-least-once: a task interrupted mid-evaluation is evaluated
/// again from the start.
pub async fn recover_unfinished(
    tasks: &dyn TaskRepository,
    queue: &EvaluationQueue,
    limit: i64,
) -> task_evaluator_core::Result<usize> {
    let mut recovered = 0;
    for status in [TaskStatus::InReview, TaskStatus::Pending] {
        for task in tasks.list_by_status(status, limit).await? {
            match queue.enqueue(task.id).await {
                Ok(()) => recovered += 1,
                Err(err) => {
                    tracing::warn!(task_id = %task.id, error = %err, "recovery enqueue failed");
                    return Ok(recovered);
                }
            }
        }
    }

    if recovered > 0 {
        tracing::info!(recovered, "re-enqueued unfinished evaluations");
    }
    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(capacity: usize) -> QueueSettings {
        QueueSettings {
            capacity,
            trigger_timeout_secs: 1,
            ..QueueSettings::default()
        }
    }

    #[tokio::test]
    async fn enqueued_jobs_arrive_in_order() {
        let (queue, mut receiver) = EvaluationQueue::new(&settings(4));
        let first = TaskId::new();
        let second = TaskId::new();

        queue.enqueue(first).await.unwrap();
        queue.enqueue(second).await.unwrap();

        assert_eq!(receiver.recv().await.unwrap().task_id, first);
        assert_eq!(receiver.recv().await.unwrap().task_id, second);
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_times_out() {
        let (queue, _receiver) = EvaluationQueue::new(&settings(1));
        queue.enqueue(TaskId::new()).await.unwrap();

        let err = queue.enqueue(TaskId::new()).await.unwrap_err();
        assert_eq!(err, EnqueueError::Timeout(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn closed_queue_reports_shutdown() {
        let (queue, receiver) = EvaluationQueue::new(&settings(1));
        drop(receiver);

        assert_eq!(queue.enqueue(TaskId::new()).await, Err(EnqueueError::Closed));
    }
}
