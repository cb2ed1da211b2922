//! Logging, metrics and health probes.

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{
    liveness_handler, readiness_handler, ComponentHealth, HealthCheck, HealthCheckRegistry,
    HealthStatus, OverallHealth, PostgresHealthCheck,
};
pub use logging::{init_logging, LogFormat, LogSettings};
pub use metrics::{init_metrics, metrics_handler, EvaluatorMetrics, MetricsError};
