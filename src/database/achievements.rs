// ABOUTME: Achievement definitions and earned achievement database operations
// ABOUTME: Awards are unique per user, achievement, and month so re-checks never double award
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_enum, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{default_achievements, Achievement, UserAchievement};

impl Database {
    pub(super) async fn migrate_achievements(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS achievements (
                    id TEXT PRIMARY KEY,
                    code TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    metric TEXT NOT NULL,
                    threshold REAL NOT NULL,
                    period TEXT NOT NULL DEFAULT 'monthly'
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS user_achievements (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    achievement_id TEXT NOT NULL REFERENCES achievements(id) ON DELETE CASCADE,
                    period_key TEXT NOT NULL,
                    value REAL NOT NULL,
                    earned_at TEXT NOT NULL,
                    UNIQUE(user_id, achievement_id, period_key)
                )
                ",
            ],
            "achievements",
        )
        .await?;

        for achievement in default_achievements() {
            sqlx::query(
                r"
                INSERT OR IGNORE INTO achievements (id, code, name, description, metric, threshold, period)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(achievement.id.to_string())
            .bind(&achievement.code)
            .bind(&achievement.name)
            .bind(&achievement.description)
            .bind(achievement.metric.as_str())
            .bind(achievement.threshold)
            .bind(&achievement.period)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to seed achievements: {e}")))?;
        }
        Ok(())
    }

    /// All achievement definitions ordered by metric then threshold
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_achievements(&self) -> AppResult<Vec<Achievement>> {
        let rows = sqlx::query(
            "SELECT id, code, name, description, metric, threshold, period FROM achievements ORDER BY metric, threshold",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list achievements: {e}")))?;

        rows.iter().map(Self::row_to_achievement).collect()
    }

    /// IDs of achievements the user earned for a period
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn earned_achievement_ids(&self, user_id: Uuid, period_key: &str) -> AppResult<HashSet<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT achievement_id FROM user_achievements WHERE user_id = $1 AND period_key = $2",
        )
        .bind(user_id.to_string())
        .bind(period_key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load earned achievements: {e}")))?;

        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    /// Award an achievement for a period; false if it was already earned
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn award_achievement(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        period_key: &str,
        value: f64,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            INSERT OR IGNORE INTO user_achievements (id, user_id, achievement_id, period_key, value, earned_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(achievement_id.to_string())
        .bind(period_key)
        .bind(value)
        .bind(fmt_ts(at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to award achievement: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Everything the user has earned, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_user_achievements(&self, user_id: Uuid) -> AppResult<Vec<UserAchievement>> {
        let rows = sqlx::query(
            r"
            SELECT ua.id AS user_achievement_id, ua.user_id, ua.period_key, ua.value, ua.earned_at,
                   a.id, a.code, a.name, a.description, a.metric, a.threshold, a.period
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1
            ORDER BY ua.earned_at DESC, a.threshold DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list user achievements: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<UserAchievement> {
                Ok(UserAchievement {
                    id: parse_uuid(&r.get::<String, _>("user_achievement_id"))?,
                    user_id: parse_uuid(&r.get::<String, _>("user_id"))?,
                    achievement: Self::row_to_achievement(r)?,
                    period_key: r.get("period_key"),
                    value: r.get("value"),
                    earned_at: parse_ts(&r.get::<String, _>("earned_at"))?,
                })
            })
            .collect()
    }

    /// Number of achievements the user has earned across all periods
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_user_achievements(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_achievements WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count achievements: {e}")))
    }

    fn row_to_achievement(row: &SqliteRow) -> AppResult<Achievement> {
        Ok(Achievement {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            code: row.get("code"),
            name: row.get("name"),
            description: row.get("description"),
            metric: parse_enum(&row.get::<String, _>("metric"))?,
            threshold: row.get("threshold"),
            period: row.get("period"),
        })
    }
}
