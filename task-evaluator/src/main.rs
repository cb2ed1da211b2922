use anyhow::{Context, Result};
use std::sync::Arc;
use task_evaluator_api::{
    clients::{CheckoutGateway, ResponsesClient, StripeClient},
    error::expose_error_details,
    observability::{init_logging, init_metrics, HealthCheckRegistry, PostgresHealthCheck},
    queue::recover_unfinished,
    routes, AppState, EvaluationQueue, EvaluationService, EvaluationWorker, Integration,
    ModelBinding, Repositories,
};
use task_evaluator_storage::{postgres, SchemaCapabilities};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

mod config;
mod shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::load().context("failed to load configuration")?;

    init_logging(&config.logging)?;
    tracing::info!("Starting Smart Task Evaluator");
    expose_error_details(config.expose_error_details);

    // Database
    let pool = postgres::create_pool(&config.database).await?;
    if config.database.run_migrations {
        postgres::migrate(&pool).await?;
    }
    SchemaCapabilities::probe(&pool).await?.require_current()?;

    if let Err(err) = init_metrics() {
        tracing::warn!(error = %err, "metrics exporter not installed");
    }

    // Outbound integrations
    let model = match config.model.settings() {
        Some(settings) => Integration::Configured(ModelBinding::new(
            Arc::new(ResponsesClient::new(settings)?),
            settings,
        )),
        None => {
            tracing::warn!("model API key not set; evaluations will use the mock report");
            Integration::Unconfigured
        }
    };
    let checkout: Integration<Arc<dyn CheckoutGateway>> = match config.payments.stripe.settings() {
        Some(settings) => Integration::Configured(Arc::new(StripeClient::new(settings)?)),
        None => {
            tracing::warn!("Stripe not configured; checkout and webhooks are disabled");
            Integration::Unconfigured
        }
    };

    // Evaluation pipeline
    let repositories = Repositories::postgres(pool.clone());
    let evaluations = EvaluationService::new(
        repositories.tasks.clone(),
        repositories.reports.clone(),
        model,
    );
    let (queue, receiver) = EvaluationQueue::new(&config.queue);
    let cancel = CancellationToken::new();
    let worker = EvaluationWorker::new(
        receiver,
        repositories.tasks.clone(),
        repositories.dead_letters.clone(),
        evaluations.clone(),
        config.queue.clone(),
        cancel.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    recover_unfinished(
        repositories.tasks.as_ref(),
        &queue,
        config.queue.recovery_batch,
    )
    .await?;

    let health = HealthCheckRegistry::new().register(Arc::new(PostgresHealthCheck::new(pool)));
    let state = AppState::new(
        &repositories,
        evaluations,
        queue,
        checkout,
        config.auth,
        config.payments,
    )
    .with_health(health);

    let app = routes(state).layer(TraceLayer::new_for_http());

    let addr = config.server.addr();
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal(cancel.clone()))
        .await?;

    // The server may also stop on its own; make sure the worker follows.
    cancel.cancel();
    if let Err(err) = worker_handle.await {
        tracing::error!(error = %err, "evaluation worker panicked");
    }
    tracing::info!("Shutdown complete");

    Ok(())
}
