// ABOUTME: Run logging route handlers: log, list, and delete own runs
// ABOUTME: Logging a run re-checks the month's achievements and returns anything newly earned
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::pagination::{clamp_limit, clamp_offset};
use crate::constants::runs::{
    FUTURE_TOLERANCE_SECONDS, MAX_DISTANCE_KM, MAX_DURATION_SECONDS, MAX_ELEVATION_GAIN_M,
    MAX_NOTES_LENGTH,
};
use crate::errors::{AppError, AppResult, FieldErrors};
use crate::extract::{Json, Path, Query};
use crate::models::{Achievement, MonthWindow, Run, RunView};
use crate::resources::ServerResources;
use crate::services::achievements::check_achievements;

/// Run logging request
#[derive(Debug, Deserialize)]
pub struct LogRunRequest {
    /// Distance in kilometers
    pub distance_km: f64,
    /// Moving time in seconds
    pub duration_seconds: i64,
    /// Elevation gain in meters
    #[serde(default)]
    pub elevation_gain_m: f64,
    /// Route the run followed
    #[serde(default)]
    pub route_id: Option<Uuid>,
    /// Start time, now when omitted
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl LogRunRequest {
    fn into_run(self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Run> {
        let mut errors = FieldErrors::new();
        errors.require(
            self.distance_km.is_finite() && self.distance_km > 0.0 && self.distance_km <= MAX_DISTANCE_KM,
            "distance_km",
            format!("Must be greater than 0 and at most {MAX_DISTANCE_KM}"),
        );
        errors.require(
            self.duration_seconds > 0 && self.duration_seconds <= MAX_DURATION_SECONDS,
            "duration_seconds",
            format!("Must be greater than 0 and at most {MAX_DURATION_SECONDS}"),
        );
        errors.require(
            self.elevation_gain_m.is_finite() && (0.0..=MAX_ELEVATION_GAIN_M).contains(&self.elevation_gain_m),
            "elevation_gain_m",
            format!("Must be between 0 and {MAX_ELEVATION_GAIN_M}"),
        );
        let started_at = self.started_at.unwrap_or(now);
        errors.require(
            started_at <= now + Duration::seconds(FUTURE_TOLERANCE_SECONDS),
            "started_at",
            "Cannot be in the future",
        );
        let notes = self.notes.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());
        errors.require(
            notes.as_ref().is_none_or(|n| n.chars().count() <= MAX_NOTES_LENGTH),
            "notes",
            format!("Must be at most {MAX_NOTES_LENGTH} characters"),
        );
        errors.into_result()?;

        Ok(Run {
            id: Uuid::new_v4(),
            user_id,
            route_id: self.route_id,
            distance_km: self.distance_km,
            duration_seconds: self.duration_seconds,
            elevation_gain_m: self.elevation_gain_m,
            started_at,
            notes,
            created_at: now,
        })
    }
}

/// Offset pagination query
#[derive(Debug, Deserialize)]
pub struct RunListQuery {
    /// Page size
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

/// Logged run plus any achievements it unlocked
#[derive(Debug, Serialize)]
pub struct LogRunResponse {
    /// The stored run
    pub run: RunView,
    /// Achievements earned by this run
    pub new_achievements: Vec<Achievement>,
}

/// Run routes
pub struct RunRoutes;

impl RunRoutes {
    /// Create all run routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/runs", get(Self::handle_list_runs).post(Self::handle_log_run))
            .route("/api/runs/:id", delete(Self::handle_delete_run))
            .with_state(resources)
    }

    async fn handle_log_run(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<LogRunRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let run = request.into_run(auth.user_id, Utc::now())?;
        if let Some(route_id) = run.route_id {
            if !resources.database.route_exists(route_id).await? {
                return Err(AppError::not_found("Route"));
            }
        }
        resources.database.create_run(&run).await?;

        let window = MonthWindow::containing(run.started_at)?;
        let new_achievements = check_achievements(&resources.database, auth.user_id, &window).await?;

        Ok((
            StatusCode::CREATED,
            Json(LogRunResponse {
                run: run.into(),
                new_achievements,
            }),
        )
            .into_response())
    }

    async fn handle_list_runs(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RunListQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let runs: Vec<RunView> = resources
            .database
            .list_runs(auth.user_id, clamp_limit(query.limit), clamp_offset(query.offset))
            .await?
            .into_iter()
            .map(RunView::from)
            .collect();
        Ok((StatusCode::OK, Json(runs)).into_response())
    }

    async fn handle_delete_run(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(run_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let run = resources
            .database
            .get_run(run_id)
            .await?
            .ok_or_else(|| AppError::not_found("Run"))?;
        auth.require_owner_or_admin(run.user_id, "delete this run")?;

        resources.database.delete_run(run.id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
