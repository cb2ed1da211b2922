//! In-process store implementing every repository port.
//!
//! Backs the API tests. Unlock semantics match the Postgres implementation:
//! the payment insert and the unlocked flag change under one write lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use task_evaluator_core::domain::{
    DeadLetter, Payment, Report, ReportId, Task, TaskId, TaskStatus, UnlockOutcome, UserId,
};
use task_evaluator_core::{
    CoreError, DeadLetterRepository, PaymentRepository, ReportRepository, Result, TaskRepository,
};

#[derive(Debug, Default)]
struct State {
    tasks: HashMap<TaskId, Task>,
    reports: HashMap<ReportId, Report>,
    payments: Vec<Payment>,
    dead_letters: Vec<DeadLetter>,
    failing_report_inserts: usize,
    failing_status_writes: Option<(TaskStatus, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|err| CoreError::Internal(format!("memory store lock poisoned: {err}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|err| CoreError::Internal(format!("memory store lock poisoned: {err}")))
    }

    /// Makes the next `count` report inserts fail with a database error.
    pub fn fail_next_report_inserts(&self, count: usize) -> Result<()> {
        self.write()?.failing_report_inserts = count;
        Ok(())
    }

    /// Makes the next `count` updates to `status` fail with a database error.
    pub fn fail_next_status_writes(&self, status: TaskStatus, count: usize) -> Result<()> {
        self.write()?.failing_status_writes = Some((status, count));
        Ok(())
    }

    pub fn payments(&self) -> Result<Vec<Payment>> {
        Ok(self.read()?.payments.clone())
    }

    pub fn dead_letters(&self) -> Result<Vec<DeadLetter>> {
        Ok(self.read()?.dead_letters.clone())
    }

    pub fn reports_for_task(&self, task_id: &TaskId) -> Result<Vec<Report>> {
        Ok(self
            .read()?
            .reports
            .values()
            .filter(|report| report.task_id == *task_id)
            .cloned()
            .collect())
    }
}

fn newest_first<T>(
    mut items: Vec<T>,
    created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
    limit: i64,
) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    items
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, task: &Task) -> Result<Task> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id) {
            return Err(CoreError::Conflict(format!("task {} already exists", task.id)));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn get_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.read()?.tasks.get(id).cloned())
    }

    async fn list_for_owner(&self, owner_id: &UserId, limit: i64) -> Result<Vec<Task>> {
        let tasks = self
            .read()?
            .tasks
            .values()
            .filter(|task| task.is_owned_by(owner_id))
            .cloned()
            .collect();
        Ok(newest_first(tasks, |task| task.created_at, limit))
    }

    async fn list_by_status(&self, status: TaskStatus, limit: i64) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .read()?
            .tasks
            .values()
            .filter(|task| task.status == status)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        tasks.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(tasks)
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let mut state = self.write()?;
        if let Some((failing, remaining)) = state.failing_status_writes.as_mut() {
            if *failing == status && *remaining > 0 {
                *remaining -= 1;
                return Err(CoreError::Database(
                    task_evaluator_core::DatabaseFailure::new("injected status update failure"),
                ));
            }
        }
        if let Some(task) = state.tasks.get_mut(id) {
            task.status = status;
        }
        Ok(())
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn create(&self, report: &Report) -> Result<Report> {
        let mut state = self.write()?;
        if state.failing_report_inserts > 0 {
            state.failing_report_inserts -= 1;
            return Err(CoreError::Database(
                task_evaluator_core::DatabaseFailure::new("injected report insert failure"),
            ));
        }
        if !state.tasks.contains_key(&report.task_id) {
            return Err(CoreError::NotFound(format!("task {}", report.task_id)));
        }
        state.reports.insert(report.id, report.clone());
        Ok(report.clone())
    }

    async fn get_for_owner(&self, id: &ReportId, owner_id: &UserId) -> Result<Option<Report>> {
        Ok(self
            .read()?
            .reports
            .get(id)
            .filter(|report| report.is_owned_by(owner_id))
            .cloned())
    }

    async fn list_for_owner(&self, owner_id: &UserId, limit: i64) -> Result<Vec<Report>> {
        let reports = self
            .read()?
            .reports
            .values()
            .filter(|report| report.is_owned_by(owner_id))
            .cloned()
            .collect();
        Ok(newest_first(reports, |report| report.created_at, limit))
    }

    async fn exists_for_task(&self, task_id: &TaskId) -> Result<bool> {
        Ok(self
            .read()?
            .reports
            .values()
            .any(|report| report.task_id == *task_id))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record_and_unlock(&self, payment: &Payment) -> Result<UnlockOutcome> {
        let mut state = self.write()?;

        let Some(was_unlocked) = state.reports.get(&payment.report_id).map(|r| r.unlocked) else {
            return Ok(UnlockOutcome::ReportNotFound);
        };

        if was_unlocked && payment.is_mock() {
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }

        let duplicate_session = payment.stripe_session_id.as_ref().is_some_and(|session| {
            state
                .payments
                .iter()
                .any(|p| p.stripe_session_id.as_ref() == Some(session))
        });
        if !duplicate_session {
            state.payments.push(payment.clone());
        }

        if let Some(report) = state.reports.get_mut(&payment.report_id) {
            report.unlocked = true;
        }

        Ok(if was_unlocked {
            UnlockOutcome::AlreadyUnlocked
        } else {
            UnlockOutcome::Unlocked
        })
    }
}

#[async_trait]
impl DeadLetterRepository for MemoryStore {
    async fn record(&self, letter: &DeadLetter) -> Result<()> {
        self.write()?.dead_letters.push(letter.clone());
        Ok(())
    }
}
