// ABOUTME: Safety alert database operations
// ABOUTME: Active listings sort by a stored severity rank so critical alerts come first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_enum, parse_opt_ts, parse_opt_uuid, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::SafetyAlert;

const ALERT_COLUMNS: &str = "id, reporter_id, route_id, alert_type, severity, title, description, \
                             latitude, longitude, expires_at, resolved_at, resolved_by, created_at";

impl Database {
    pub(super) async fn migrate_safety_alerts(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS safety_alerts (
                    id TEXT PRIMARY KEY,
                    reporter_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    route_id TEXT REFERENCES routes(id) ON DELETE CASCADE,
                    alert_type TEXT NOT NULL,
                    severity TEXT NOT NULL,
                    severity_rank INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    latitude REAL,
                    longitude REAL,
                    expires_at TEXT NOT NULL,
                    resolved_at TEXT,
                    resolved_by TEXT REFERENCES users(id) ON DELETE SET NULL,
                    created_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_safety_alerts_open ON safety_alerts(resolved_at, expires_at)",
            ],
            "safety alerts",
        )
        .await
    }

    /// Insert an alert
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_alert(&self, alert: &SafetyAlert) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO safety_alerts
                (id, reporter_id, route_id, alert_type, severity, severity_rank, title, description,
                 latitude, longitude, expires_at, resolved_at, resolved_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(alert.id.to_string())
        .bind(alert.reporter_id.to_string())
        .bind(alert.route_id.map(|id| id.to_string()))
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(alert.severity.rank())
        .bind(&alert.title)
        .bind(&alert.description)
        .bind(alert.latitude)
        .bind(alert.longitude)
        .bind(fmt_ts(alert.expires_at))
        .bind(alert.resolved_at.map(fmt_ts))
        .bind(alert.resolved_by.map(|id| id.to_string()))
        .bind(fmt_ts(alert.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create safety alert: {e}")))?;

        Ok(alert.id)
    }

    /// Get an alert by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_alert(&self, alert_id: Uuid) -> AppResult<Option<SafetyAlert>> {
        let row = sqlx::query(&format!("SELECT {ALERT_COLUMNS} FROM safety_alerts WHERE id = $1"))
            .bind(alert_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get safety alert: {e}")))?;

        row.map(|r| Self::row_to_alert(&r)).transpose()
    }

    /// Unresolved, unexpired alerts, most severe first, then newest
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_active_alerts(&self, now: DateTime<Utc>, route_id: Option<Uuid>) -> AppResult<Vec<SafetyAlert>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ALERT_COLUMNS} FROM safety_alerts
            WHERE resolved_at IS NULL AND expires_at > $1
              AND ($2 IS NULL OR route_id = $2)
            ORDER BY severity_rank DESC, created_at DESC
            "
        ))
        .bind(fmt_ts(now))
        .bind(route_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list safety alerts: {e}")))?;

        rows.iter().map(Self::row_to_alert).collect()
    }

    /// Resolve an alert; false if it was already resolved
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn resolve_alert(&self, alert_id: Uuid, resolved_by: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE safety_alerts SET resolved_at = $1, resolved_by = $2 WHERE id = $3 AND resolved_at IS NULL",
        )
        .bind(fmt_ts(at))
        .bind(resolved_by.to_string())
        .bind(alert_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to resolve safety alert: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of active alerts
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_open_alerts(&self, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM safety_alerts WHERE resolved_at IS NULL AND expires_at > $1")
            .bind(fmt_ts(now))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count safety alerts: {e}")))
    }

    fn row_to_alert(row: &SqliteRow) -> AppResult<SafetyAlert> {
        Ok(SafetyAlert {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            reporter_id: parse_uuid(&row.get::<String, _>("reporter_id"))?,
            route_id: parse_opt_uuid(row.get("route_id"))?,
            alert_type: parse_enum(&row.get::<String, _>("alert_type"))?,
            severity: parse_enum(&row.get::<String, _>("severity"))?,
            title: row.get("title"),
            description: row.get("description"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            expires_at: parse_ts(&row.get::<String, _>("expires_at"))?,
            resolved_at: parse_opt_ts(row.get("resolved_at"))?,
            resolved_by: parse_opt_uuid(row.get("resolved_by"))?,
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        })
    }
}
