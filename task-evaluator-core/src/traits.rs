use async_trait::async_trait;

use crate::domain::{
    DeadLetter, Payment, Report, ReportId, Task, TaskId, TaskStatus, UnlockOutcome, UserId,
};
use crate::error::Result;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<Task>;
    async fn get_by_id(&self, id: &TaskId) -> Result<Option<Task>>;
    async fn list_for_owner(&self, owner_id: &UserId, limit: i64) -> Result<Vec<Task>>;
    async fn list_by_status(&self, status: TaskStatus, limit: i64) -> Result<Vec<Task>>;
    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<()>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &Report) -> Result<Report>;
    /// Ownership-filtered lookup; another user's report reads as absent.
    async fn get_for_owner(&self, id: &ReportId, owner_id: &UserId) -> Result<Option<Report>>;
    async fn list_for_owner(&self, owner_id: &UserId, limit: i64) -> Result<Vec<Report>>;
    async fn exists_for_task(&self, task_id: &TaskId) -> Result<bool>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Records the payment and sets the report's unlocked flag in a single
    /// transaction. Processor payments are idempotent on their session id.
    async fn record_and_unlock(&self, payment: &Payment) -> Result<UnlockOutcome>;
}

#[async_trait]
pub trait DeadLetterRepository: Send + Sync {
    async fn record(&self, letter: &DeadLetter) -> Result<()>;
}
