// ABOUTME: Notification database operations
// ABOUTME: Every query is scoped to the owning user so one user never reads another's rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_enum, parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Notification;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, data, read_at, created_at";

impl Database {
    pub(super) async fn migrate_notifications(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS notifications (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    kind TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT,
                    data TEXT NOT NULL DEFAULT '{}',
                    read_at TEXT,
                    created_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at)",
            ],
            "notifications",
        )
        .await
    }

    /// Insert a notification
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_notification(&self, notification: &Notification) -> AppResult<Uuid> {
        sqlx::query(&format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(notification.id.to_string())
        .bind(notification.user_id.to_string())
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.data.to_string())
        .bind(notification.read_at.map(fmt_ts))
        .bind(fmt_ts(notification.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create notification: {e}")))?;

        Ok(notification.id)
    }

    /// A user's notifications, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE user_id = $1 AND ($2 = 0 OR read_at IS NULL)
            ORDER BY created_at DESC, rowid DESC
            LIMIT $3
            "
        ))
        .bind(user_id.to_string())
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list notifications: {e}")))?;

        rows.iter().map(Self::row_to_notification).collect()
    }

    /// Number of unread notifications
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count notifications: {e}")))
    }

    /// Get a notification by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_notification(&self, notification_id: Uuid) -> AppResult<Option<Notification>> {
        let row = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(notification_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get notification: {e}")))?;

        row.map(|r| Self::row_to_notification(&r)).transpose()
    }

    /// Mark one notification read; already read ones keep their timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_notification_read(&self, notification_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET read_at = $1 WHERE id = $2 AND read_at IS NULL")
            .bind(fmt_ts(at))
            .bind(notification_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to mark notification read: {e}")))?;
        Ok(())
    }

    /// Mark every unread notification of a user read; returns how many changed
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_all_notifications_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("UPDATE notifications SET read_at = $1 WHERE user_id = $2 AND read_at IS NULL")
            .bind(fmt_ts(at))
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to mark notifications read: {e}")))?;
        Ok(result.rows_affected())
    }

    /// Delete a notification
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_notification(&self, notification_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete notification: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_notification(row: &SqliteRow) -> AppResult<Notification> {
        let data: String = row.get("data");
        Ok(Notification {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
            kind: parse_enum(&row.get::<String, _>("kind"))?,
            title: row.get("title"),
            body: row.get("body"),
            data: serde_json::from_str(&data)
                .map_err(|e| AppError::database(format!("Invalid notification data: {e}")))?,
            read_at: parse_opt_ts(row.get("read_at"))?,
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        })
    }
}
