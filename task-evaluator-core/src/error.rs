use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Migration required: column {table}.{column} is missing")]
    MigrationRequired { table: String, column: String },

    #[error("Database error: {0}")]
    Database(DatabaseFailure),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn migration_required(table: impl Into<String>, column: impl Into<String>) -> Self {
        CoreError::MigrationRequired {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Backend detail attached to the error, if the backend supplied any.
    pub fn database_failure(&self) -> Option<&DatabaseFailure> {
        match self {
            CoreError::Database(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Structured detail of a failed backend statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseFailure {
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
    pub code: Option<String>,
}

impl DatabaseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for DatabaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// Postgres SQLSTATE for a reference to a column that does not exist.
pub const UNDEFINED_COLUMN: &str = "42703";

#[cfg(feature = "database")]
mod database {
    use super::{CoreError, DatabaseFailure, UNDEFINED_COLUMN};
    use regex::Regex;
    use sqlx::postgres::PgDatabaseError;
    use std::sync::LazyLock;

    static MISSING_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"column "?(?P<column>[A-Za-z_][A-Za-z0-9_]*)"?(?: of relation "?(?P<table>[A-Za-z_][A-Za-z0-9_]*)"?)? does not exist"#)
            .expect("static regex")
    });

    impl From<sqlx::Error> for CoreError {
        fn from(err: sqlx::Error) -> Self {
            match err {
                sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
                sqlx::Error::Database(db_err) => {
                    let code = db_err.code().map(|c| c.into_owned());
                    let message = db_err.message().to_string();

                    if code.as_deref() == Some(UNDEFINED_COLUMN) {
                        if let Some(caps) = MISSING_COLUMN.captures(&message) {
                            let table = caps
                                .name("table")
                                .map(|m| m.as_str().to_string())
                                .or_else(|| db_err.table().map(str::to_string))
                                .unwrap_or_else(|| "unknown".to_string());
                            return CoreError::migration_required(table, &caps["column"]);
                        }
                    }

                    let (details, hint) = match db_err.try_downcast_ref::<PgDatabaseError>() {
                        Some(pg) => (pg.detail().map(str::to_string), pg.hint().map(str::to_string)),
                        None => (None, None),
                    };

                    CoreError::Database(DatabaseFailure {
                        message,
                        details,
                        hint,
                        code,
                    })
                }
                other => CoreError::Database(DatabaseFailure::new(other.to_string())),
            }
        }
    }

    impl From<sqlx::migrate::MigrateError> for CoreError {
        fn from(err: sqlx::migrate::MigrateError) -> Self {
            CoreError::Database(DatabaseFailure::new(err.to_string()))
        }
    }
}
