// ABOUTME: Training plan template database operations
// ABOUTME: Stores the weekly structure as JSON and lists plans by visibility and difficulty
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_enum, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{PlanDifficulty, TrainingPlan};

/// Which plans a caller may list
#[derive(Debug, Clone, Copy)]
pub struct PlanFilter {
    /// Caller; their own private plans are included
    pub viewer_id: Uuid,
    /// Admins see every plan
    pub include_all_private: bool,
    /// Optional difficulty filter
    pub difficulty: Option<PlanDifficulty>,
}

/// Plan with the number of assignments made from it
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanWithCount {
    /// The plan
    #[serde(flatten)]
    pub plan: TrainingPlan,
    /// All assignments, any status
    pub assignment_count: i64,
    /// Assignments currently active
    pub active_count: i64,
}

const PLAN_COLUMNS: &str = "id, trainer_id, title, description, difficulty, duration_weeks, \
                            weekly_structure, is_public, created_at, updated_at";

impl Database {
    pub(super) async fn migrate_training_plans(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS training_plans (
                    id TEXT PRIMARY KEY,
                    trainer_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT,
                    difficulty TEXT NOT NULL,
                    duration_weeks INTEGER NOT NULL CHECK (duration_weeks BETWEEN 1 AND 52),
                    weekly_structure TEXT NOT NULL,
                    is_public BOOLEAN NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS plan_assignments (
                    id TEXT PRIMARY KEY,
                    plan_id TEXT NOT NULL REFERENCES training_plans(id) ON DELETE CASCADE,
                    runner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    assigned_by TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    status TEXT NOT NULL DEFAULT 'active'
                        CHECK (status IN ('active', 'paused', 'completed', 'abandoned')),
                    start_date TEXT NOT NULL,
                    completed_workouts TEXT NOT NULL DEFAULT '[]',
                    completion_percentage REAL NOT NULL DEFAULT 0,
                    started_at TEXT NOT NULL,
                    paused_at TEXT,
                    completed_at TEXT,
                    updated_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_training_plans_trainer ON training_plans(trainer_id)",
                "CREATE INDEX IF NOT EXISTS idx_plan_assignments_plan ON plan_assignments(plan_id)",
                "CREATE INDEX IF NOT EXISTS idx_plan_assignments_runner ON plan_assignments(runner_id)",
                // At most one active assignment per runner
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_plan_assignments_one_active
                ON plan_assignments(runner_id) WHERE status = 'active'
                ",
            ],
            "training plans",
        )
        .await
    }

    /// Insert a new plan
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn create_plan(&self, plan: &TrainingPlan) -> AppResult<Uuid> {
        sqlx::query(&format!(
            "INSERT INTO training_plans ({PLAN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(plan.id.to_string())
        .bind(plan.trainer_id.to_string())
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.difficulty.as_str())
        .bind(i64::from(plan.duration_weeks))
        .bind(serde_json::to_string(&plan.weekly_structure)?)
        .bind(plan.is_public)
        .bind(fmt_ts(plan.created_at))
        .bind(fmt_ts(plan.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create training plan: {e}")))?;

        Ok(plan.id)
    }

    /// Get a plan by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_plan(&self, plan_id: Uuid) -> AppResult<Option<TrainingPlan>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAN_COLUMNS} FROM training_plans WHERE id = $1"
        ))
        .bind(plan_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get training plan: {e}")))?;

        row.map(|r| Self::row_to_plan(&r)).transpose()
    }

    /// Persist edits to an existing plan and re-align its open assignments
    ///
    /// Returns the number of assignments whose progress changed because
    /// workouts were added or removed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any statement fails; nothing is
    /// written in that case
    pub async fn update_plan(&self, plan: &TrainingPlan) -> AppResult<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            UPDATE training_plans
            SET title = $1, description = $2, difficulty = $3, duration_weeks = $4,
                weekly_structure = $5, is_public = $6, updated_at = $7
            WHERE id = $8
            ",
        )
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.difficulty.as_str())
        .bind(i64::from(plan.duration_weeks))
        .bind(serde_json::to_string(&plan.weekly_structure)?)
        .bind(plan.is_public)
        .bind(fmt_ts(plan.updated_at))
        .bind(plan.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update training plan: {e}")))?;

        let resynced = Self::resync_plan_assignments(&mut *tx, plan).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit plan update: {e}")))?;
        Ok(resynced)
    }

    /// Delete a plan; its assignments cascade
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_plan(&self, plan_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM training_plans WHERE id = $1")
            .bind(plan_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete training plan: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// List plans visible to the caller, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_plans(&self, filter: PlanFilter) -> AppResult<Vec<TrainingPlan>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {PLAN_COLUMNS} FROM training_plans
            WHERE ($1 OR is_public = 1 OR trainer_id = $2)
              AND ($3 IS NULL OR difficulty = $3)
            ORDER BY created_at DESC, rowid DESC
            "
        ))
        .bind(filter.include_all_private)
        .bind(filter.viewer_id.to_string())
        .bind(filter.difficulty.map(|d| d.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list training plans: {e}")))?;

        rows.iter().map(Self::row_to_plan).collect()
    }

    /// A trainer's plans with assignment counts
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_plans_with_counts(&self, trainer_id: Uuid) -> AppResult<Vec<PlanWithCount>> {
        let rows = sqlx::query(
            r"
            SELECT p.id, p.trainer_id, p.title, p.description, p.difficulty, p.duration_weeks,
                   p.weekly_structure, p.is_public, p.created_at, p.updated_at,
                   COUNT(a.id) AS assignment_count,
                   COALESCE(SUM(CASE WHEN a.status = 'active' THEN 1 ELSE 0 END), 0) AS active_count
            FROM training_plans p
            LEFT JOIN plan_assignments a ON a.plan_id = p.id
            WHERE p.trainer_id = $1
            GROUP BY p.id
            ORDER BY p.created_at DESC
            ",
        )
        .bind(trainer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list trainer plans: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<PlanWithCount> {
                Ok(PlanWithCount {
                    plan: Self::row_to_plan(r)?,
                    assignment_count: r.get("assignment_count"),
                    active_count: r.get("active_count"),
                })
            })
            .collect()
    }

    pub(super) fn row_to_plan(row: &SqliteRow) -> AppResult<TrainingPlan> {
        let structure: String = row.get("weekly_structure");
        Ok(TrainingPlan {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            trainer_id: parse_uuid(&row.get::<String, _>("trainer_id"))?,
            title: row.get("title"),
            description: row.get("description"),
            difficulty: parse_enum(&row.get::<String, _>("difficulty"))?,
            duration_weeks: u32::try_from(row.get::<i64, _>("duration_weeks"))
                .map_err(|e| AppError::database(format!("Invalid duration_weeks: {e}")))?,
            weekly_structure: serde_json::from_str(&structure)
                .map_err(|e| AppError::database(format!("Invalid weekly_structure: {e}")))?,
            is_public: row.get("is_public"),
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
            updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
        })
    }
}
