use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use task_evaluator_core::{CoreError, DatabaseFailure};
use thiserror::Error;
use validator::ValidationErrors;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Whether 5xx responses carry backend detail. Off in production.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        dev: Option<DatabaseFailure>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::Jwt(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Misconfigured(_)
            | ApiError::Storage { .. }
            | ApiError::Database(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body; backend detail is included only when `expose` is set.
    pub fn body(&self, expose: bool) -> Value {
        let (message, details, dev) = match self {
            ApiError::Validation(msg) => ("Validation error", Some(msg.clone()), None),
            ApiError::BadRequest(msg) => ("Bad request", Some(msg.clone()), None),
            ApiError::Unauthorized => ("Unauthorized", None, None),
            ApiError::Forbidden => ("Forbidden", None, None),
            ApiError::NotFound(msg) => ("Resource not found", Some(msg.clone()), None),
            ApiError::Conflict(msg) => ("Conflict", Some(msg.clone()), None),
            ApiError::Misconfigured(hint) => ("Service misconfigured", Some(hint.clone()), None),
            ApiError::Jwt(_) => ("Invalid token", None, None),
            ApiError::Upstream(msg) => ("Upstream service error", expose.then(|| msg.clone()), None),
            ApiError::Storage { message, dev } => (
                "Storage error",
                expose.then(|| message.clone()),
                dev.as_ref().filter(|_| expose),
            ),
            ApiError::Database(err) => ("Database error", expose.then(|| err.to_string()), None),
            ApiError::Internal(msg) => ("Internal server error", expose.then(|| msg.clone()), None),
        };

        let mut body = json!({ "error": message });
        if let Some(details) = details {
            body["details"] = json!(details);
        }
        if let Some(dev) = dev {
            body["dev"] = json!(dev);
        }
        body
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::Validation(msg),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Unauthorized(_) => ApiError::Unauthorized,
            CoreError::MigrationRequired { table, column } => {
                let message = format!(
                    "Column {table}.{column} is missing; apply the pending database migrations"
                );
                ApiError::Storage {
                    dev: Some(DatabaseFailure {
                        message: message.clone(),
                        details: None,
                        hint: Some("run the migrations in task-evaluator-storage/migrations".into()),
                        code: Some(task_evaluator_core::error::UNDEFINED_COLUMN.to_string()),
                    }),
                    message,
                }
            }
            CoreError::Database(failure) => ApiError::Storage {
                message: failure.message.clone(),
                dev: Some(failure),
            },
            CoreError::Serialization(msg) | CoreError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(format!("Validation failed: {}", errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Jwt(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            match &self {
                ApiError::Storage { dev, .. } => {
                    tracing::error!(error = %self, dev = ?dev, "storage failure")
                }
                _ => tracing::error!(error = %self, "request failed"),
            }
        }

        let body = self.body(EXPOSE_DETAILS.load(Ordering::Relaxed));
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_validation_maps_to_400_with_message() {
        let err = ApiError::from(CoreError::Validation(
            "Title, description, and code are required.".into(),
        ));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(false)["details"],
            "Title, description, and code are required."
        );
    }

    #[test]
    fn storage_detail_is_hidden_unless_exposed() {
        let err = ApiError::from(CoreError::Database(DatabaseFailure {
            message: "insert failed".into(),
            details: Some("Key (task_id) is not present".into()),
            hint: None,
            code: Some("23503".into()),
        }));

        let hidden = err.body(false);
        assert_eq!(hidden, json!({ "error": "Storage error" }));

        let shown = err.body(true);
        assert_eq!(shown["details"], "insert failed");
        assert_eq!(shown["dev"]["code"], "23503");
        assert_eq!(shown["dev"]["details"], "Key (task_id) is not present");
    }

    #[test]
    fn migration_required_names_the_column() {
        let err = ApiError::from(CoreError::migration_required("tasks", "language"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body(true);
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("tasks.language"));
        assert_eq!(body["dev"]["code"], "42703");
    }

    #[test]
    fn misconfiguration_is_a_server_error_with_hint() {
        let err = ApiError::Misconfigured("Set payments.stripe.secret_key".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(false)["details"], "Set payments.stripe.secret_key");
    }
}
