//! HTTP surface of the Smart Task Evaluator.
//!
//! [`routes`] builds the full router over an [`AppState`]; the binary adds
//! tracing and serves it. Repositories are trait objects, so the same router
//! runs against Postgres in production and [`MemoryStore`] in tests.

pub mod clients;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod queue;
pub mod security;
pub mod services;
pub mod settings;
pub mod worker;

pub use dto::*;
pub use error::{ApiError, ApiResult};
pub use queue::{EvaluationJob, EvaluationQueue};
pub use services::{EvaluationService, ModelBinding};
pub use settings::Integration;
pub use worker::EvaluationWorker;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use task_evaluator_core::{DeadLetterRepository, PaymentRepository, ReportRepository, TaskRepository};
use task_evaluator_storage::{
    MemoryStore, PgDeadLetterRepository, PgPaymentRepository, PgReportRepository,
    PgTaskRepository,
};

use clients::CheckoutGateway;
use observability::HealthCheckRegistry;
use settings::{AuthSettings, PaymentSettings};

/// The repository ports, bundled so the API and the worker share one set.
#[derive(Clone)]
pub struct Repositories {
    pub tasks: Arc<dyn TaskRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub dead_letters: Arc<dyn DeadLetterRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            reports: Arc::new(PgReportRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            dead_letters: Arc::new(PgDeadLetterRepository::new(pool)),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self {
            tasks: Arc::new(store.clone()),
            reports: Arc::new(store.clone()),
            payments: Arc::new(store.clone()),
            dead_letters: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub evaluations: EvaluationService,
    pub queue: EvaluationQueue,
    pub checkout: Integration<Arc<dyn CheckoutGateway>>,
    pub auth: Arc<AuthSettings>,
    pub payment_settings: Arc<PaymentSettings>,
    pub health: HealthCheckRegistry,
}

impl AppState {
    pub fn new(
        repositories: &Repositories,
        evaluations: EvaluationService,
        queue: EvaluationQueue,
        checkout: Integration<Arc<dyn CheckoutGateway>>,
        auth: AuthSettings,
        payment_settings: PaymentSettings,
    ) -> Self {
        Self {
            tasks: repositories.tasks.clone(),
            reports: repositories.reports.clone(),
            payments: repositories.payments.clone(),
            evaluations,
            queue,
            checkout,
            auth: Arc::new(auth),
            payment_settings: Arc::new(payment_settings),
            health: HealthCheckRegistry::new(),
        }
    }

    pub fn with_health(mut self, health: HealthCheckRegistry) -> Self {
        self.health = health;
        self
    }
}

pub fn routes(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/tasks", post(handlers::tasks::create).get(handlers::tasks::list))
        .route("/tasks/:id", get(handlers::tasks::get))
        .route("/run-evaluation", post(handlers::evaluations::run))
        .route("/reports", get(handlers::reports::list))
        .route("/reports/:id", get(handlers::reports::get))
        .route("/payments/checkout", post(handlers::payments::checkout))
        .route("/payments/mock", post(handlers::payments::mock_unlock))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(observability::liveness_handler))
        .route("/health/ready", get(observability::readiness_handler))
        .route("/metrics", get(observability::metrics_handler))
        .route("/stripe/webhook", post(handlers::webhook::stripe_webhook))
        .merge(authenticated)
        .with_state(state)
}
