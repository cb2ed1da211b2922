use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn http_status(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>, latency: Duration) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: Some(latency.as_millis() as u64),
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            latency_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealth {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealth>,
}

impl IntoResponse for OverallHealth {
    fn into_response(self) -> Response {
        (self.status.http_status(), Json(self)).into_response()
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> ComponentHealth;
}

/// `SELECT 1` against the pool, bounded by a timeout.
pub struct PostgresHealthCheck {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresHealthCheck {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: Duration::from_secs(3),
        }
    }
}

#[async_trait]
impl HealthCheck for PostgresHealthCheck {
    async fn check(&self) -> ComponentHealth {
        let start = Instant::now();

        match tokio::time::timeout(self.timeout, sqlx::query("SELECT 1").execute(&self.pool)).await
        {
            Ok(Ok(_)) => ComponentHealth::healthy("postgres", start.elapsed()),
            Ok(Err(e)) => {
                tracing::error!("PostgreSQL health check failed: {}", e);
                ComponentHealth::unhealthy("postgres", format!("Database error: {}", e))
            }
            Err(_) => {
                tracing::warn!("PostgreSQL health check timed out");
                ComponentHealth::unhealthy("postgres", "Health check timed out")
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct HealthCheckRegistry {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthCheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub async fn check_readiness(&self) -> OverallHealth {
        let components =
            futures::future::join_all(self.checks.iter().map(|check| check.check())).await;
        let status = if components
            .iter()
            .all(|component| component.status == HealthStatus::Healthy)
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        OverallHealth { status, components }
    }
}

/// `GET /health`
pub async fn liveness_handler() -> &'static str {
    "OK"
}

/// `GET /health/ready`
pub async fn readiness_handler(State(state): State<AppState>) -> OverallHealth {
    state.health.check_readiness().await
}
