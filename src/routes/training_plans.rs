// ABOUTME: Training plan and assignment route handlers
// ABOUTME: Plan CRUD for trainers, assignment and enrollment, workout completion, status changes, progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Training plan routes
//!
//! Plans are templates owned by a trainer. Assignments are a runner's
//! enrollment in a plan; their lifecycle rules live in the model and in
//! [`crate::services::assignments`], so handlers here only authenticate,
//! validate input, and shape responses.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthResult;
use crate::constants::plans::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use crate::database::PlanFilter;
use crate::errors::{AppError, AppResult, FieldErrors};
use crate::extract::{Json, Path, Query};
use crate::logging::AppLogger;
use crate::models::{
    validate_duration_weeks, AssignmentAction, AssignmentProgress, PlanAssignment, PlanDifficulty,
    TrainingPlan, UserRole, WeeklyStructure,
};
use crate::resources::ServerResources;
use crate::services::assignments::{change_status, load_for_actor, start_assignment};
use crate::services::notifications::Notifier;

/// Plan create or replace request
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// Plan title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Difficulty
    pub difficulty: PlanDifficulty,
    /// Declared length in weeks
    pub duration_weeks: u32,
    /// Week-by-week workouts
    pub weekly_structure: WeeklyStructure,
    /// Whether runners can find and enroll in the plan
    #[serde(default = "default_public")]
    pub is_public: bool,
}

const fn default_public() -> bool {
    true
}

impl PlanRequest {
    fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        let title_len = self.title.trim().chars().count();
        errors.require(
            (1..=MAX_TITLE_LENGTH).contains(&title_len),
            "title",
            format!("Must be between 1 and {MAX_TITLE_LENGTH} characters"),
        );
        errors.require(
            self.description
                .as_ref()
                .is_none_or(|d| d.chars().count() <= MAX_DESCRIPTION_LENGTH),
            "description",
            format!("Must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
        validate_duration_weeks(self.duration_weeks, &mut errors);
        self.weekly_structure
            .validate(self.duration_weeks, &mut errors);
        errors.into_result()
    }

    fn apply_to(self, plan: &mut TrainingPlan) {
        plan.title = self.title.trim().to_owned();
        plan.description = self.description.filter(|d| !d.trim().is_empty());
        plan.difficulty = self.difficulty;
        plan.duration_weeks = self.duration_weeks;
        plan.weekly_structure = self.weekly_structure;
        plan.is_public = self.is_public;
        plan.updated_at = Utc::now();
    }
}

/// Plan listing query
#[derive(Debug, Deserialize)]
pub struct PlanListQuery {
    /// Optional difficulty filter
    pub difficulty: Option<PlanDifficulty>,
}

/// Trainer assigns a plan to a runner
#[derive(Debug, Deserialize)]
pub struct AssignPlanRequest {
    /// Runner receiving the plan
    pub runner_id: Uuid,
    /// First day of week 1, today when omitted
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Runner enrolls in a public plan
#[derive(Debug, Default)]
pub struct EnrollRequest {
    /// First day of week 1, today when omitted
    pub start_date: Option<NaiveDate>,
}

impl EnrollRequest {
    /// Parse an optional JSON body; an empty body enrolls from today
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| AppError::invalid_input(format!("Malformed JSON body: {e}")))?;
        let serde_json::Value::Object(fields) = value else {
            return Err(AppError::invalid_input("Request body must be a JSON object"));
        };

        let mut errors = FieldErrors::new();
        let start_date = match fields.get("start_date") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(raw)) => {
                let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
                errors.require(parsed.is_some(), "start_date", "Must be a calendar date (YYYY-MM-DD)");
                parsed
            }
            Some(_) => {
                errors.add("start_date", "Must be a calendar date (YYYY-MM-DD)");
                None
            }
        };
        errors.into_result()?;
        Ok(Self { start_date })
    }
}

/// Operator-triggered status change
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    /// Action to apply
    pub action: AssignmentAction,
}

/// Assignment with its plan and progress
#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    /// The assignment
    pub assignment: PlanAssignment,
    /// Plan the assignment follows
    pub plan: TrainingPlan,
    /// Derived progress
    pub progress: AssignmentProgress,
}

impl AssignmentDetail {
    fn build(assignment: PlanAssignment, plan: TrainingPlan) -> Self {
        let progress = AssignmentProgress::compute(&plan, &assignment, Utc::now().date_naive());
        Self {
            assignment,
            plan,
            progress,
        }
    }
}

/// Training plan and assignment routes
pub struct TrainingPlanRoutes;

impl TrainingPlanRoutes {
    /// Create all training plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/plans",
                get(Self::handle_list_plans).post(Self::handle_create_plan),
            )
            .route(
                "/api/plans/:id",
                get(Self::handle_get_plan)
                    .put(Self::handle_update_plan)
                    .delete(Self::handle_delete_plan),
            )
            .route("/api/plans/:id/assign", post(Self::handle_assign_plan))
            .route("/api/plans/:id/enroll", post(Self::handle_enroll))
            .route("/api/assignments", get(Self::handle_list_own_assignments))
            .route("/api/trainer/assignments", get(Self::handle_list_trainer_assignments))
            .route("/api/assignments/:id", get(Self::handle_get_assignment))
            .route("/api/assignments/:id/progress", get(Self::handle_get_progress))
            .route("/api/assignments/:id/status", post(Self::handle_change_status))
            .route(
                "/api/assignments/:id/workouts/:week/:index",
                post(Self::handle_complete_workout).delete(Self::handle_uncomplete_workout),
            )
            .with_state(resources)
    }

    async fn authenticate(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AuthResult> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(headers)
            .await
    }

    /// Load a plan the caller may see; private plans of others look missing
    async fn load_visible_plan(
        resources: &ServerResources,
        auth: &AuthResult,
        plan_id: Uuid,
    ) -> AppResult<TrainingPlan> {
        resources
            .database
            .get_plan(plan_id)
            .await?
            .filter(|p| p.is_public || p.trainer_id == auth.user_id || auth.role.is_admin())
            .ok_or_else(|| AppError::not_found("Training plan"))
    }

    async fn handle_create_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<PlanRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        auth.require_role(&[UserRole::Trainer, UserRole::Admin])?;
        request.validate()?;

        let now = Utc::now();
        let mut plan = TrainingPlan {
            id: Uuid::new_v4(),
            trainer_id: auth.user_id,
            title: String::new(),
            description: None,
            difficulty: request.difficulty,
            duration_weeks: request.duration_weeks,
            weekly_structure: WeeklyStructure::default(),
            is_public: request.is_public,
            created_at: now,
            updated_at: now,
        };
        request.apply_to(&mut plan);
        resources.database.create_plan(&plan).await?;

        AppLogger::log_domain_event("plan_created", &auth.user_id.to_string(), &plan.id.to_string());
        Ok((StatusCode::CREATED, Json(plan)).into_response())
    }

    async fn handle_list_plans(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<PlanListQuery>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let plans = resources
            .database
            .list_plans(PlanFilter {
                viewer_id: auth.user_id,
                include_all_private: auth.role.is_admin(),
                difficulty: query.difficulty,
            })
            .await?;
        Ok((StatusCode::OK, Json(plans)).into_response())
    }

    async fn handle_get_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let plan = Self::load_visible_plan(&resources, &auth, plan_id).await?;
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    async fn handle_update_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
        Json(request): Json<PlanRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let mut plan = Self::load_visible_plan(&resources, &auth, plan_id).await?;
        auth.require_owner_or_admin(plan.trainer_id, "edit this plan")?;
        request.validate()?;

        request.apply_to(&mut plan);
        let resynced = resources.database.update_plan(&plan).await?;
        AppLogger::log_domain_event("plan_updated", &auth.user_id.to_string(), &plan.id.to_string());
        if resynced > 0 {
            tracing::info!(plan_id = %plan.id, resynced, "Recomputed assignment progress after plan edit");
        }
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    async fn handle_delete_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let plan = Self::load_visible_plan(&resources, &auth, plan_id).await?;
        auth.require_owner_or_admin(plan.trainer_id, "delete this plan")?;

        resources.database.delete_plan(plan.id).await?;
        AppLogger::log_domain_event("plan_deleted", &auth.user_id.to_string(), &plan.id.to_string());
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    async fn handle_assign_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
        Json(request): Json<AssignPlanRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        auth.require_role(&[UserRole::Trainer, UserRole::Admin])?;
        let plan = Self::load_visible_plan(&resources, &auth, plan_id).await?;
        auth.require_owner_or_admin(plan.trainer_id, "assign this plan")?;

        let runner = resources
            .database
            .get_user(request.runner_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::not_found("Runner"))?;
        if runner.role != UserRole::Runner {
            return Err(AppError::invalid_input("Plans can only be assigned to runners"));
        }

        let start_date = request.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let assignment =
            start_assignment(&resources.database, &plan, runner.id, auth.user_id, start_date).await?;

        Notifier::new(&resources.database)
            .plan_assigned(runner.id, assignment.id, &plan)
            .await;
        AppLogger::log_domain_event("plan_assigned", &runner.id.to_string(), &assignment.id.to_string());

        Ok((StatusCode::CREATED, Json(AssignmentDetail::build(assignment, plan))).into_response())
    }

    async fn handle_enroll(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        auth.require_role(&[UserRole::Runner])?;

        let plan = resources
            .database
            .get_plan(plan_id)
            .await?
            .filter(|p| p.is_public)
            .ok_or_else(|| AppError::not_found("Training plan"))?;

        let request = EnrollRequest::from_body(&body)?;
        let start_date = request.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let assignment =
            start_assignment(&resources.database, &plan, auth.user_id, auth.user_id, start_date).await?;

        AppLogger::log_domain_event("plan_enrolled", &auth.user_id.to_string(), &assignment.id.to_string());
        Ok((StatusCode::CREATED, Json(AssignmentDetail::build(assignment, plan))).into_response())
    }

    async fn handle_list_own_assignments(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let assignments = resources
            .database
            .list_assignments_for_runner(auth.user_id)
            .await?;
        Ok((StatusCode::OK, Json(assignments)).into_response())
    }

    async fn handle_list_trainer_assignments(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        auth.require_role(&[UserRole::Trainer, UserRole::Admin])?;
        let assignments = resources
            .database
            .list_assignments_for_trainer(auth.user_id)
            .await?;
        Ok((StatusCode::OK, Json(assignments)).into_response())
    }

    async fn handle_get_assignment(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(assignment_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let (assignment, plan) = load_for_actor(&resources.database, &auth, assignment_id).await?;
        Ok((StatusCode::OK, Json(AssignmentDetail::build(assignment, plan))).into_response())
    }

    async fn handle_get_progress(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(assignment_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let (assignment, plan) = load_for_actor(&resources.database, &auth, assignment_id).await?;
        let progress = AssignmentProgress::compute(&plan, &assignment, Utc::now().date_naive());
        Ok((StatusCode::OK, Json(progress)).into_response())
    }

    async fn handle_change_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(assignment_id): Path<Uuid>,
        Json(request): Json<StatusChangeRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let (mut assignment, plan) = load_for_actor(&resources.database, &auth, assignment_id).await?;

        change_status(&resources.database, &mut assignment, request.action, Utc::now()).await?;
        AppLogger::log_domain_event(
            &format!("assignment_{}", assignment.status),
            &auth.user_id.to_string(),
            &assignment.id.to_string(),
        );
        Ok((StatusCode::OK, Json(AssignmentDetail::build(assignment, plan))).into_response())
    }

    /// Workout completion is the runner's own record; admins may correct it
    fn require_runner_or_admin(auth: &AuthResult, assignment: &PlanAssignment) -> AppResult<()> {
        auth.require_owner_or_admin(assignment.runner_id, "record workouts on this assignment")
    }

    async fn handle_complete_workout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((assignment_id, week, index)): Path<(Uuid, u32, u32)>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let (mut assignment, plan) = load_for_actor(&resources.database, &auth, assignment_id).await?;
        Self::require_runner_or_admin(&auth, &assignment)?;

        let changed = assignment.complete_workout(&plan.weekly_structure, week, index, Utc::now())?;
        if changed {
            resources.database.update_assignment(&assignment).await?;
            if assignment.completed_at.is_some() {
                AppLogger::log_domain_event(
                    "assignment_completed",
                    &assignment.runner_id.to_string(),
                    &assignment.id.to_string(),
                );
            }
        }
        Ok((StatusCode::OK, Json(AssignmentDetail::build(assignment, plan))).into_response())
    }

    async fn handle_uncomplete_workout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((assignment_id, week, index)): Path<(Uuid, u32, u32)>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let (mut assignment, plan) = load_for_actor(&resources.database, &auth, assignment_id).await?;
        Self::require_runner_or_admin(&auth, &assignment)?;

        if assignment.uncomplete_workout(&plan.weekly_structure, week, index, Utc::now())? {
            resources.database.update_assignment(&assignment).await?;
        }
        Ok((StatusCode::OK, Json(AssignmentDetail::build(assignment, plan))).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::{PlanWeek, PlannedWorkout, WorkoutKind};

    fn request(duration_weeks: u32, weeks: Vec<u32>) -> PlanRequest {
        PlanRequest {
            title: "10K Builder".into(),
            description: None,
            difficulty: PlanDifficulty::Beginner,
            duration_weeks,
            weekly_structure: WeeklyStructure {
                weeks: weeks
                    .into_iter()
                    .map(|week| PlanWeek {
                        week,
                        focus: None,
                        workouts: vec![PlannedWorkout {
                            day: Some("monday".into()),
                            kind: WorkoutKind::EasyRun,
                            description: "Easy 5k".into(),
                            distance_km: Some(5.0),
                            duration_minutes: None,
                        }],
                    })
                    .collect(),
            },
            is_public: true,
        }
    }

    #[test]
    fn test_valid_plan_request() {
        assert!(request(2, vec![1, 2]).validate().is_ok());
    }

    #[test]
    fn test_plan_request_rejects_out_of_range_weeks() {
        let err = request(1, vec![1, 2]).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = request(0, vec![]).validate().unwrap_err();
        let fields = &err.details.unwrap()["fields"];
        assert!(fields.get("duration_weeks").is_some());
        assert!(fields.get("weekly_structure").is_some());
    }
}
