// ABOUTME: Plan assignment lifecycle: creation, actor checks, and status changes
// ABOUTME: Keeps the one-active-assignment-per-runner rule in one place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::AuthResult;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{AssignmentAction, PlanAssignment, TrainingPlan};

fn already_active() -> AppError {
    AppError::already_exists("Runner already has an active plan assignment")
}

/// Create an active assignment of `plan` for `runner_id`
///
/// # Errors
///
/// Returns `RESOURCE_ALREADY_EXISTS` if the runner already has an active
/// assignment, or a database error
pub async fn start_assignment(
    database: &Database,
    plan: &TrainingPlan,
    runner_id: Uuid,
    assigned_by: Uuid,
    start_date: NaiveDate,
) -> AppResult<PlanAssignment> {
    if database.get_active_assignment(runner_id).await?.is_some() {
        return Err(already_active());
    }

    let assignment = PlanAssignment::new(plan.id, runner_id, assigned_by, start_date);
    // The partial unique index catches a concurrent enrollment the check missed
    database.create_assignment(&assignment).await?;
    Ok(assignment)
}

/// Load an assignment and its plan, checking the caller may act on it
///
/// The runner, the plan's trainer, and admins may act on an assignment.
///
/// # Errors
///
/// Returns `RESOURCE_NOT_FOUND` for an unknown assignment and
/// `PERMISSION_DENIED` for anyone else
pub async fn load_for_actor(
    database: &Database,
    auth: &AuthResult,
    assignment_id: Uuid,
) -> AppResult<(PlanAssignment, TrainingPlan)> {
    let assignment = database
        .get_assignment(assignment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Plan assignment"))?;
    let plan = database
        .get_plan(assignment.plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("Training plan"))?;

    if auth.user_id != assignment.runner_id && auth.user_id != plan.trainer_id && !auth.role.is_admin() {
        return Err(AppError::permission_denied(
            "Only the runner, the plan's trainer, or an admin can manage this assignment",
        ));
    }
    Ok((assignment, plan))
}

/// Apply a status change and persist it
///
/// # Errors
///
/// Returns `INVALID_STATE` for a disallowed transition,
/// `RESOURCE_ALREADY_EXISTS` when resuming would create a second active
/// assignment, or a database error
pub async fn change_status(
    database: &Database,
    assignment: &mut PlanAssignment,
    action: AssignmentAction,
    now: DateTime<Utc>,
) -> AppResult<()> {
    assignment.apply(action, now)?;

    if action == AssignmentAction::Resume {
        if let Some(active) = database.get_active_assignment(assignment.runner_id).await? {
            if active.id != assignment.id {
                return Err(already_active());
            }
        }
    }

    database.update_assignment(assignment).await
}
