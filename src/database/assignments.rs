// ABOUTME: Plan assignment database operations
// ABOUTME: Maps the one-active-assignment index violation to a conflict and resyncs progress on plan edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Executor, Row, Sqlite};
use uuid::Uuid;

use super::{fmt_ts, is_unique_violation, parse_date, parse_enum, parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{AssignmentStatus, PlanAssignment, TrainingPlan};

/// Assignment row as listed for a trainer
#[derive(Debug, Clone, Serialize)]
pub struct TrainerAssignmentRow {
    /// The assignment
    #[serde(flatten)]
    pub assignment: PlanAssignment,
    /// Plan title
    pub plan_title: String,
    /// Runner display name
    pub runner_name: String,
}

const ASSIGNMENT_COLUMNS: &str = "a.id, a.plan_id, a.runner_id, a.assigned_by, a.status, a.start_date, \
     a.completed_workouts, a.completion_percentage, a.started_at, a.paused_at, a.completed_at, a.updated_at";

fn active_conflict() -> AppError {
    AppError::already_exists("Runner already has an active plan assignment")
}

async fn write_assignment<'e, E>(executor: E, assignment: &PlanAssignment) -> AppResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        UPDATE plan_assignments
        SET status = $1, completed_workouts = $2, completion_percentage = $3,
            paused_at = $4, completed_at = $5, updated_at = $6
        WHERE id = $7
        ",
    )
    .bind(assignment.status.as_str())
    .bind(serde_json::to_string(&assignment.completed_workouts)?)
    .bind(assignment.completion_percentage)
    .bind(assignment.paused_at.map(fmt_ts))
    .bind(assignment.completed_at.map(fmt_ts))
    .bind(fmt_ts(assignment.updated_at))
    .bind(assignment.id.to_string())
    .execute(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            active_conflict()
        } else {
            AppError::database(format!("Failed to update plan assignment: {e}"))
        }
    })?;
    Ok(())
}

impl Database {
    /// Insert a new assignment
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_ALREADY_EXISTS` if the runner already has an active
    /// assignment, or a database error
    pub async fn create_assignment(&self, assignment: &PlanAssignment) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO plan_assignments
                (id, plan_id, runner_id, assigned_by, status, start_date, completed_workouts,
                 completion_percentage, started_at, paused_at, completed_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(assignment.id.to_string())
        .bind(assignment.plan_id.to_string())
        .bind(assignment.runner_id.to_string())
        .bind(assignment.assigned_by.to_string())
        .bind(assignment.status.as_str())
        .bind(assignment.start_date.format("%Y-%m-%d").to_string())
        .bind(serde_json::to_string(&assignment.completed_workouts)?)
        .bind(assignment.completion_percentage)
        .bind(fmt_ts(assignment.started_at))
        .bind(assignment.paused_at.map(fmt_ts))
        .bind(assignment.completed_at.map(fmt_ts))
        .bind(fmt_ts(assignment.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                active_conflict()
            } else {
                AppError::database(format!("Failed to create plan assignment: {e}"))
            }
        })?;

        Ok(assignment.id)
    }

    /// Get an assignment by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_assignment(&self, assignment_id: Uuid) -> AppResult<Option<PlanAssignment>> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM plan_assignments a WHERE a.id = $1"
        ))
        .bind(assignment_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get plan assignment: {e}")))?;

        row.map(|r| Self::row_to_assignment(&r)).transpose()
    }

    /// The runner's active assignment, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_active_assignment(&self, runner_id: Uuid) -> AppResult<Option<PlanAssignment>> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM plan_assignments a WHERE a.runner_id = $1 AND a.status = $2"
        ))
        .bind(runner_id.to_string())
        .bind(AssignmentStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get active assignment: {e}")))?;

        row.map(|r| Self::row_to_assignment(&r)).transpose()
    }

    /// Persist status and progress changes
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_ALREADY_EXISTS` when reactivating would create a
    /// second active assignment, or a database error
    pub async fn update_assignment(&self, assignment: &PlanAssignment) -> AppResult<()> {
        write_assignment(&self.pool, assignment).await
    }

    /// Re-align every open assignment of a plan with its current structure
    ///
    /// Runs on the caller's connection so a plan edit and the progress it
    /// invalidates commit together. Returns how many assignments changed.
    pub(super) async fn resync_plan_assignments(
        conn: &mut SqliteConnection,
        plan: &TrainingPlan,
    ) -> AppResult<usize> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM plan_assignments a WHERE a.plan_id = $1 AND a.status IN ($2, $3)"
        ))
        .bind(plan.id.to_string())
        .bind(AssignmentStatus::Active.as_str())
        .bind(AssignmentStatus::Paused.as_str())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load plan assignments: {e}")))?;

        let mut changed = 0;
        for row in &rows {
            let mut assignment = Self::row_to_assignment(row)?;
            if assignment.resync(&plan.weekly_structure, plan.updated_at) {
                write_assignment(&mut *conn, &assignment).await?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// A runner's assignments, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_assignments_for_runner(&self, runner_id: Uuid) -> AppResult<Vec<PlanAssignment>> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM plan_assignments a WHERE a.runner_id = $1 ORDER BY a.started_at DESC"
        ))
        .bind(runner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list assignments: {e}")))?;

        rows.iter().map(Self::row_to_assignment).collect()
    }

    /// All assignments of a trainer's plans with plan and runner names
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_assignments_for_trainer(&self, trainer_id: Uuid) -> AppResult<Vec<TrainerAssignmentRow>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ASSIGNMENT_COLUMNS}, p.title AS plan_title, u.display_name AS runner_name
            FROM plan_assignments a
            JOIN training_plans p ON p.id = a.plan_id
            JOIN users u ON u.id = a.runner_id
            WHERE p.trainer_id = $1
            ORDER BY a.updated_at DESC
            "
        ))
        .bind(trainer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list trainer assignments: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<TrainerAssignmentRow> {
                Ok(TrainerAssignmentRow {
                    assignment: Self::row_to_assignment(r)?,
                    plan_title: r.get("plan_title"),
                    runner_name: r.get("runner_name"),
                })
            })
            .collect()
    }

    fn row_to_assignment(row: &SqliteRow) -> AppResult<PlanAssignment> {
        let completed: String = row.get("completed_workouts");
        Ok(PlanAssignment {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            plan_id: parse_uuid(&row.get::<String, _>("plan_id"))?,
            runner_id: parse_uuid(&row.get::<String, _>("runner_id"))?,
            assigned_by: parse_uuid(&row.get::<String, _>("assigned_by"))?,
            status: parse_enum(&row.get::<String, _>("status"))?,
            start_date: parse_date(&row.get::<String, _>("start_date"))?,
            completed_workouts: serde_json::from_str(&completed)
                .map_err(|e| AppError::database(format!("Invalid completed_workouts: {e}")))?,
            completion_percentage: row.get("completion_percentage"),
            started_at: parse_ts(&row.get::<String, _>("started_at"))?,
            paused_at: parse_opt_ts(row.get("paused_at"))?,
            completed_at: parse_opt_ts(row.get("completed_at"))?,
            updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
        })
    }
}
