// ABOUTME: Follow graph database operations
// ABOUTME: Pending edges are stored but only approved edges appear in follower lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, is_unique_violation, parse_enum, parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Follow, FollowStatus, UserSummary};

const FOLLOW_COLUMNS: &str = "id, follower_id, followed_id, status, created_at, approved_at";

impl Database {
    pub(super) async fn migrate_follows(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS follows (
                    id TEXT PRIMARY KEY,
                    follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    followed_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved')),
                    created_at TEXT NOT NULL,
                    approved_at TEXT,
                    UNIQUE(follower_id, followed_id),
                    CHECK (follower_id != followed_id)
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows(followed_id, status)",
            ],
            "follows",
        )
        .await
    }

    /// Insert a follow request
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_ALREADY_EXISTS` if an edge already exists
    pub async fn create_follow(&self, follow: &Follow) -> AppResult<Uuid> {
        sqlx::query(&format!(
            "INSERT INTO follows ({FOLLOW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(follow.id.to_string())
        .bind(follow.follower_id.to_string())
        .bind(follow.followed_id.to_string())
        .bind(follow.status.as_str())
        .bind(fmt_ts(follow.created_at))
        .bind(follow.approved_at.map(fmt_ts))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("Already following or requested")
            } else {
                AppError::database(format!("Failed to create follow: {e}"))
            }
        })?;

        Ok(follow.id)
    }

    /// Get a follow edge by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_follow(&self, follow_id: Uuid) -> AppResult<Option<Follow>> {
        let row = sqlx::query(&format!("SELECT {FOLLOW_COLUMNS} FROM follows WHERE id = $1"))
            .bind(follow_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get follow: {e}")))?;

        row.map(|r| Self::row_to_follow(&r)).transpose()
    }

    /// The edge from `follower_id` to `followed_id`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_follow_between(&self, follower_id: Uuid, followed_id: Uuid) -> AppResult<Option<Follow>> {
        let row = sqlx::query(&format!(
            "SELECT {FOLLOW_COLUMNS} FROM follows WHERE follower_id = $1 AND followed_id = $2"
        ))
        .bind(follower_id.to_string())
        .bind(followed_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get follow: {e}")))?;

        row.map(|r| Self::row_to_follow(&r)).transpose()
    }

    /// Approve a pending edge; returns false if it was not pending
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn approve_follow(&self, follow_id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE follows SET status = $1, approved_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(FollowStatus::Approved.as_str())
        .bind(fmt_ts(at))
        .bind(follow_id.to_string())
        .bind(FollowStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to approve follow: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a follow edge
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_follow(&self, follow_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE id = $1")
            .bind(follow_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete follow: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Users with an approved edge to `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        self.list_follow_users(
            r"
            SELECT u.id, u.display_name, u.role FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followed_id = $1 AND f.status = $2
            ORDER BY u.display_name
            ",
            user_id,
        )
        .await
    }

    /// Users `user_id` follows with an approved edge
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        self.list_follow_users(
            r"
            SELECT u.id, u.display_name, u.role FROM follows f
            JOIN users u ON u.id = f.followed_id
            WHERE f.follower_id = $1 AND f.status = $2
            ORDER BY u.display_name
            ",
            user_id,
        )
        .await
    }

    async fn list_follow_users(&self, query: &str, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let rows = sqlx::query(query)
            .bind(user_id.to_string())
            .bind(FollowStatus::Approved.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list follows: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<UserSummary> {
                Ok(UserSummary {
                    id: parse_uuid(&r.get::<String, _>("id"))?,
                    display_name: r.get("display_name"),
                    role: parse_enum(&r.get::<String, _>("role"))?,
                })
            })
            .collect()
    }

    /// Incoming pending requests with the requester's summary, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_pending_requests(&self, user_id: Uuid) -> AppResult<Vec<(Follow, UserSummary)>> {
        let rows = sqlx::query(
            r"
            SELECT f.id, f.follower_id, f.followed_id, f.status, f.created_at, f.approved_at,
                   u.display_name, u.role
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followed_id = $1 AND f.status = $2
            ORDER BY f.created_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(FollowStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list follow requests: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<(Follow, UserSummary)> {
                let follow = Self::row_to_follow(r)?;
                let requester = UserSummary {
                    id: follow.follower_id,
                    display_name: r.get("display_name"),
                    role: parse_enum(&r.get::<String, _>("role"))?,
                };
                Ok((follow, requester))
            })
            .collect()
    }

    /// Approved follower and following counts
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn follow_counts(&self, user_id: Uuid) -> AppResult<(i64, i64)> {
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followed_id = $1 AND status = $2) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND status = $2) AS following
            ",
        )
        .bind(user_id.to_string())
        .bind(FollowStatus::Approved.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count follows: {e}")))?;

        Ok((row.get("followers"), row.get("following")))
    }

    fn row_to_follow(row: &SqliteRow) -> AppResult<Follow> {
        Ok(Follow {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            follower_id: parse_uuid(&row.get::<String, _>("follower_id"))?,
            followed_id: parse_uuid(&row.get::<String, _>("followed_id"))?,
            status: parse_enum(&row.get::<String, _>("status"))?,
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
            approved_at: parse_opt_ts(row.get("approved_at"))?,
        })
    }
}
