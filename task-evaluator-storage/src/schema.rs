//! Which optional columns the connected database actually has.
//!
//! Deployments have run with a `tasks` table that predates the `language` and
//! `status` columns. Rather than dropping those fields on insert, the schema
//! is probed once at startup and the server refuses to run against a
//! database that still needs a migration.

use sqlx::PgPool;
use std::collections::BTreeSet;
use task_evaluator_core::{CoreError, Result};

/// Columns added after the first schema version, with the migration that adds them.
pub const VERSIONED_COLUMNS: &[(&str, &str, &str)] = &[
    ("tasks", "language", "20251130000001_initial_schema"),
    ("tasks", "status", "20251130000001_initial_schema"),
    ("reports", "unlocked", "20251130000001_initial_schema"),
    ("payments", "stripe_session_id", "20251130000001_initial_schema"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCapabilities {
    columns: BTreeSet<(String, String)>,
}

impl SchemaCapabilities {
    /// Reads the column list of the current schema.
    pub async fn probe(pool: &PgPool) -> Result<Self> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT table_name::text, column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema()
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(Self::from_columns(rows))
    }

    pub fn from_columns<I, T, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(table, column)| (table.into(), column.into()))
                .collect(),
        }
    }

    /// A capability set with every versioned column present.
    pub fn current() -> Self {
        Self::from_columns(
            VERSIONED_COLUMNS
                .iter()
                .map(|(table, column, _)| (*table, *column)),
        )
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns
            .contains(&(table.to_string(), column.to_string()))
    }

    /// Versioned columns this database lacks, as `(table, column, migration)`.
    pub fn missing(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        VERSIONED_COLUMNS
            .iter()
            .copied()
            .filter(|(table, column, _)| !self.has_column(table, column))
            .collect()
    }

    /// Fails with [`CoreError::MigrationRequired`] for the first missing column.
    pub fn require_current(&self) -> Result<()> {
        match self.missing().first() {
            Some((table, column, migration)) => {
                tracing::error!(
                    table,
                    column,
                    migration,
                    "database schema is behind the code; apply the migration"
                );
                Err(CoreError::migration_required(*table, *column))
            }
            None => Ok(()),
        }
    }
}
