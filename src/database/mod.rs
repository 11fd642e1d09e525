// ABOUTME: SQLite database manager with per-domain migrations and queries
// ABOUTME: Owns the sqlx pool and the shared row conversion helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! Every domain adds its own `impl Database` block in a sibling module with a
//! `migrate_*` function and its queries. Timestamps are stored as RFC 3339
//! text with millisecond precision and a `Z` suffix so that lexical order in
//! SQL equals chronological order.

mod achievements;
mod assignments;
mod follows;
mod forum;
mod messages;
mod notifications;
mod running_routes;
mod runs;
mod safety_alerts;
mod training_plans;
mod users;

pub use assignments::TrainerAssignmentRow;
pub use running_routes::RouteFilter;
pub use training_plans::{PlanFilter, PlanWithCount};

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::pagination::PaginationParams;

/// Database manager shared by all handlers
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect, enable foreign keys, and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!("Database ready at {}", database_url);
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Round-trip a trivial query to confirm the pool can serve requests
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired or the query fails
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE` statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_training_plans().await?;
        self.migrate_running_routes().await?;
        self.migrate_runs().await?;
        self.migrate_follows().await?;
        self.migrate_forum().await?;
        self.migrate_notifications().await?;
        self.migrate_messages().await?;
        self.migrate_achievements().await?;
        self.migrate_safety_alerts().await?;
        Ok(())
    }

    /// Execute a list of DDL statements
    async fn execute_ddl(&self, statements: &[&str], what: &str) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to migrate {what}: {e}")))?;
        }
        Ok(())
    }
}

/// Format a timestamp for storage
pub(crate) fn fmt_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp
pub(crate) fn parse_ts(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid date '{value}': {e}")))
}

/// Parse an optional stored timestamp
pub(crate) fn parse_opt_ts(value: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_ts).transpose()
}

/// Parse a stored UUID
pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Invalid UUID '{value}': {e}")))
}

/// Parse an optional stored UUID
pub(crate) fn parse_opt_uuid(value: Option<String>) -> AppResult<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

/// Parse a stored calendar date
pub(crate) fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::database(format!("Invalid date '{value}': {e}")))
}

/// Parse a stored enum column
pub(crate) fn parse_enum<T>(value: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    value
        .parse()
        .map_err(|e: AppError| AppError::database(e.message))
}

/// Keyset position after a newest-first cursor
///
/// Cursors pair the ordering timestamp with the row's `rowid`, which grows
/// with insertion order and so breaks same-millisecond ties chronologically.
pub(crate) fn cursor_position(params: &PaginationParams) -> AppResult<(Option<String>, Option<i64>)> {
    let Some((ts, seq)) = params.after.as_ref() else {
        return Ok((None, None));
    };
    let seq = seq
        .parse::<i64>()
        .map_err(|_| AppError::invalid_input("Invalid pagination cursor"))?;
    Ok((Some(fmt_ts(*ts)), Some(seq)))
}

/// Whether a sqlx error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format_sorts_lexically() {
        let a = DateTime::parse_from_rfc3339("2026-01-09T23:59:59.999Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2026-01-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(fmt_ts(b), "2026-01-10T00:00:00.000Z");
        assert!(fmt_ts(a) < fmt_ts(b));
        assert_eq!(parse_ts(&fmt_ts(a)).unwrap(), a);
    }

    #[tokio::test]
    async fn test_in_memory_database_migrates_twice() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievements")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 6);
    }
}
