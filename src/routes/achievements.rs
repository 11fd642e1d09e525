// ABOUTME: Achievement route handlers: definitions with this month's status and the caller's earned list
// ABOUTME: Monthly status is keyed by the current UTC month's period key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    errors::AppError,
    models::{Achievement, MonthWindow},
    resources::ServerResources,
};

/// Definition with the caller's progress this month
#[derive(Debug, Serialize)]
pub struct AchievementStatus {
    /// The definition
    #[serde(flatten)]
    pub achievement: Achievement,
    /// Earned for the current month
    pub earned: bool,
    /// Current month's value of the measured quantity
    pub current_value: f64,
}

/// Achievement routes
pub struct AchievementRoutes;

impl AchievementRoutes {
    /// Create all achievement routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/achievements", get(Self::handle_list_definitions))
            .route("/api/achievements/mine", get(Self::handle_list_earned))
            .with_state(resources)
    }

    async fn handle_list_definitions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let window = MonthWindow::containing(Utc::now())?;
        let period_key = window.period_key();
        let totals = resources.database.month_totals(auth.user_id, &window).await?;
        let earned = resources
            .database
            .earned_achievement_ids(auth.user_id, &period_key)
            .await?;

        let achievements: Vec<AchievementStatus> = resources
            .database
            .list_achievements()
            .await?
            .into_iter()
            .map(|achievement| AchievementStatus {
                earned: earned.contains(&achievement.id),
                current_value: totals.value(achievement.metric),
                achievement,
            })
            .collect();

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "period_key": period_key, "achievements": achievements })),
        )
            .into_response())
    }

    async fn handle_list_earned(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        let earned = resources.database.list_user_achievements(auth.user_id).await?;
        Ok((StatusCode::OK, Json(earned)).into_response())
    }
}
