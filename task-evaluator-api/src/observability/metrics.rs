//! Prometheus metrics for the evaluator.
//!
//! [`init_metrics`] installs the global recorder once at startup; the
//! counters below are no-ops until then, so tests can run without it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use thiserror::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to install metrics recorder: {0}")]
    Installation(String),
}

/// Installs the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), MetricsError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    // A concurrent initializer may have won; both handles render the same data.
    let _ = PROMETHEUS_HANDLE.set(handle);

    describe_counter!("tasks_created_total", "Tasks accepted by POST /tasks");
    describe_counter!(
        "evaluations_completed_total",
        "Reports written, by whether the model or the mock fallback produced them"
    );
    describe_counter!(
        "evaluation_dead_letters_total",
        "Evaluation jobs that exhausted their retries"
    );
    describe_counter!("reports_unlocked_total", "Reports unlocked, by unlock path");
    describe_counter!("webhook_events_total", "Processor webhook deliveries, by outcome");

    Ok(())
}

/// `GET /metrics` in Prometheus text format.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => {
            tracing::error!("metrics handler called but metrics not initialized");
            (StatusCode::INTERNAL_SERVER_ERROR, "Metrics not initialized").into_response()
        }
    }
}

/// Domain counters.
pub struct EvaluatorMetrics;

impl EvaluatorMetrics {
    pub fn task_created() {
        counter!("tasks_created_total").increment(1);
    }

    /// `source` is `model` or `mock`.
    pub fn evaluation_completed(source: &'static str) {
        counter!("evaluations_completed_total", "source" => source).increment(1);
    }

    pub fn dead_letter() {
        counter!("evaluation_dead_letters_total").increment(1);
    }

    /// `via` is `webhook` or `mock`.
    pub fn report_unlocked(via: &'static str) {
        counter!("reports_unlocked_total", "via" => via).increment(1);
    }

    pub fn webhook_event(outcome: &'static str) {
        counter!("webhook_events_total", "outcome" => outcome).increment(1);
    }
}
