// ABOUTME: Run logging database operations and run aggregates
// ABOUTME: Covers month totals, the follow feed, leaderboard candidates, and recent route runners
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{cursor_position, fmt_ts, parse_opt_uuid, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{FeedItem, FollowStatus, LeaderboardCandidate, MonthTotals, MonthWindow, Run, RunView};
use crate::pagination::PaginationParams;

const RUN_COLUMNS: &str = "r.id, r.user_id, r.route_id, r.distance_km, r.duration_seconds, \
                           r.elevation_gain_m, r.started_at, r.notes, r.created_at";

impl Database {
    pub(super) async fn migrate_runs(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS runs (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    route_id TEXT REFERENCES routes(id) ON DELETE SET NULL,
                    distance_km REAL NOT NULL CHECK (distance_km > 0),
                    duration_seconds INTEGER NOT NULL CHECK (duration_seconds > 0),
                    elevation_gain_m REAL NOT NULL DEFAULT 0,
                    started_at TEXT NOT NULL,
                    notes TEXT,
                    created_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_runs_user_started ON runs(user_id, started_at)",
                "CREATE INDEX IF NOT EXISTS idx_runs_route ON runs(route_id, duration_seconds)",
            ],
            "runs",
        )
        .await
    }

    /// Insert a run
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_run(&self, run: &Run) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO runs (id, user_id, route_id, distance_km, duration_seconds, elevation_gain_m, started_at, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(run.id.to_string())
        .bind(run.user_id.to_string())
        .bind(run.route_id.map(|id| id.to_string()))
        .bind(run.distance_km)
        .bind(run.duration_seconds)
        .bind(run.elevation_gain_m)
        .bind(fmt_ts(run.started_at))
        .bind(&run.notes)
        .bind(fmt_ts(run.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create run: {e}")))?;

        Ok(run.id)
    }

    /// Get a run by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_run(&self, run_id: Uuid) -> AppResult<Option<Run>> {
        let row = sqlx::query(&format!("SELECT {RUN_COLUMNS} FROM runs r WHERE r.id = $1"))
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get run: {e}")))?;

        row.map(|r| Self::row_to_run(&r)).transpose()
    }

    /// Delete a run
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_run(&self, run_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM runs WHERE id = $1")
            .bind(run_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete run: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// A user's runs, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_runs(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Run>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {RUN_COLUMNS} FROM runs r
            WHERE r.user_id = $1
            ORDER BY r.started_at DESC, r.rowid DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list runs: {e}")))?;

        rows.iter().map(Self::row_to_run).collect()
    }

    /// Distance, elevation, and count of runs started inside `window`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn month_totals(&self, user_id: Uuid, window: &MonthWindow) -> AppResult<MonthTotals> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(distance_km), 0.0) AS distance_km,
                   COALESCE(SUM(elevation_gain_m), 0.0) AS elevation_m,
                   COUNT(*) AS run_count
            FROM runs
            WHERE user_id = $1 AND started_at >= $2 AND started_at < $3
            ",
        )
        .bind(user_id.to_string())
        .bind(fmt_ts(window.start))
        .bind(fmt_ts(window.end))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate runs: {e}")))?;

        Ok(MonthTotals {
            distance_km: row.get("distance_km"),
            elevation_m: row.get("elevation_m"),
            run_count: row.get("run_count"),
        })
    }

    /// Lifetime distance and run count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn lifetime_totals(&self, user_id: Uuid) -> AppResult<(f64, i64)> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(distance_km), 0.0) AS distance_km, COUNT(*) AS run_count FROM runs WHERE user_id = $1",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate runs: {e}")))?;

        Ok((row.get("distance_km"), row.get("run_count")))
    }

    /// Runs of the user and of everyone they follow with an approved edge
    ///
    /// Fetches `params.fetch_limit()` rows, newest first, continuing after the
    /// cursor position when one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn feed(&self, user_id: Uuid, params: &PaginationParams) -> AppResult<Vec<FeedItem>> {
        let (after_ts, after_seq) = cursor_position(params)?;

        let rows = sqlx::query(&format!(
            r"
            SELECT r.rowid AS seq, {RUN_COLUMNS}, u.display_name
            FROM runs r
            JOIN users u ON u.id = r.user_id
            WHERE (r.user_id = $1 OR r.user_id IN (
                    SELECT followed_id FROM follows WHERE follower_id = $1 AND status = $2))
              AND ($3 IS NULL OR r.started_at < $3 OR (r.started_at = $3 AND r.rowid < $4))
            ORDER BY r.started_at DESC, r.rowid DESC
            LIMIT $5
            "
        ))
        .bind(user_id.to_string())
        .bind(FollowStatus::Approved.as_str())
        .bind(after_ts)
        .bind(after_seq)
        .bind(params.fetch_limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load feed: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<FeedItem> {
                Ok(FeedItem {
                    seq: r.get("seq"),
                    run: RunView::from(Self::row_to_run(r)?),
                    display_name: r.get("display_name"),
                })
            })
            .collect()
    }

    /// Each runner's fastest run on a route, with the runner's name
    ///
    /// Equal best times from one runner all come back; ranking keeps one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn leaderboard_candidates(&self, route_id: Uuid) -> AppResult<Vec<LeaderboardCandidate>> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.user_id, r.duration_seconds, r.started_at, u.display_name
            FROM runs r
            JOIN users u ON u.id = r.user_id
            WHERE r.route_id = $1
              AND r.duration_seconds = (
                  SELECT MIN(r2.duration_seconds) FROM runs r2
                  WHERE r2.route_id = r.route_id AND r2.user_id = r.user_id)
            ",
        )
        .bind(route_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load leaderboard: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<LeaderboardCandidate> {
                Ok(LeaderboardCandidate {
                    user_id: parse_uuid(&r.get::<String, _>("user_id"))?,
                    display_name: r.get("display_name"),
                    run_id: parse_uuid(&r.get::<String, _>("id"))?,
                    duration_seconds: r.get("duration_seconds"),
                    started_at: parse_ts(&r.get::<String, _>("started_at"))?,
                })
            })
            .collect()
    }

    /// Users who logged a run on the route since `since`, excluding one user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recent_route_runners(
        &self,
        route_id: Uuid,
        since: DateTime<Utc>,
        exclude: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT DISTINCT user_id FROM runs
            WHERE route_id = $1 AND started_at >= $2 AND user_id != $3
            ",
        )
        .bind(route_id.to_string())
        .bind(fmt_ts(since))
        .bind(exclude.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find route runners: {e}")))?;

        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    fn row_to_run(row: &SqliteRow) -> AppResult<Run> {
        Ok(Run {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
            route_id: parse_opt_uuid(row.get("route_id"))?,
            distance_km: row.get("distance_km"),
            duration_seconds: row.get("duration_seconds"),
            elevation_gain_m: row.get("elevation_gain_m"),
            started_at: parse_ts(&row.get::<String, _>("started_at"))?,
            notes: row.get("notes"),
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        })
    }
}
