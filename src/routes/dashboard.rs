// ABOUTME: Dashboard page routes returning component page props per role
// ABOUTME: /dashboard redirects by stored role and each role page sits behind a page guard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Dashboard routes
//!
//! Page routes answer with `{"component": ..., "props": ...}` for the front
//! end to render. Unlike the JSON API they redirect instead of failing: the
//! entry point sends users to the dashboard of their stored role and the
//! role pages send strangers back to their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::auth::AuthResult;
use crate::constants::runs::DASHBOARD_RECENT_RUNS;
use crate::errors::AppError;
use crate::middleware::role_guard::LOGIN_PATH;
use crate::middleware::{require_page_role, PageGuard};
use crate::models::{AssignmentProgress, MonthWindow, RunView, UserRole};
use crate::resources::ServerResources;

/// Front-end page payload
#[derive(Debug, Serialize)]
pub struct PageProps {
    /// Component the front end renders
    pub component: &'static str,
    /// Component props
    pub props: serde_json::Value,
}

impl PageProps {
    fn respond(component: &'static str, props: serde_json::Value) -> Response {
        (StatusCode::OK, Json(Self { component, props })).into_response()
    }
}

/// Dashboard routes
pub struct DashboardRoutes;

impl DashboardRoutes {
    /// Create the dashboard entry point and the guarded role pages
    pub fn routes(resources: &Arc<ServerResources>) -> Router {
        let guard = |role| {
            middleware::from_fn_with_state(PageGuard::new(resources.clone(), role), require_page_role)
        };

        let runner = Router::new()
            .route("/runner/dashboard", get(Self::handle_runner_dashboard))
            .route_layer(guard(UserRole::Runner));
        let trainer = Router::new()
            .route("/trainer/dashboard", get(Self::handle_trainer_dashboard))
            .route_layer(guard(UserRole::Trainer));
        let admin = Router::new()
            .route("/admin/dashboard", get(Self::handle_admin_dashboard))
            .route_layer(guard(UserRole::Admin));

        Router::new()
            .route("/dashboard", get(Self::handle_dashboard_redirect))
            .merge(runner)
            .merge(trainer)
            .merge(admin)
            .with_state(resources.clone())
    }

    /// Send the user to the dashboard of their stored role
    async fn handle_dashboard_redirect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Response {
        match resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await
        {
            Ok(auth) => Redirect::to(auth.role.dashboard_path()).into_response(),
            Err(_) => Redirect::to(LOGIN_PATH).into_response(),
        }
    }

    /// Runner dashboard: active plan, recent runs, this month, unread counts
    async fn handle_runner_dashboard(
        State(resources): State<Arc<ServerResources>>,
        Extension(auth): Extension<AuthResult>,
    ) -> Result<Response, AppError> {
        let database = &resources.database;
        let now = Utc::now();

        let active_plan = match database.get_active_assignment(auth.user_id).await? {
            Some(assignment) => match database.get_plan(assignment.plan_id).await? {
                Some(plan) => {
                    let progress = AssignmentProgress::compute(&plan, &assignment, now.date_naive());
                    Some(json!({ "assignment": assignment, "plan": plan, "progress": progress }))
                }
                None => None,
            },
            None => None,
        };

        let recent_runs: Vec<RunView> = database
            .list_runs(auth.user_id, DASHBOARD_RECENT_RUNS, 0)
            .await?
            .into_iter()
            .map(RunView::from)
            .collect();

        let window = MonthWindow::containing(now)?;
        let month_totals = database.month_totals(auth.user_id, &window).await?;
        let unread_notifications = database.unread_notification_count(auth.user_id).await?;
        let achievements_earned = database.count_user_achievements(auth.user_id).await?;

        Ok(PageProps::respond(
            "RunnerDashboard",
            json!({
                "user": { "id": auth.user_id, "display_name": auth.display_name },
                "active_plan": active_plan,
                "recent_runs": recent_runs,
                "month": { "period_key": window.period_key(), "totals": month_totals },
                "unread_notifications": unread_notifications,
                "achievements_earned": achievements_earned,
            }),
        ))
    }

    /// Trainer dashboard: own plans with counts and their assignments
    async fn handle_trainer_dashboard(
        State(resources): State<Arc<ServerResources>>,
        Extension(auth): Extension<AuthResult>,
    ) -> Result<Response, AppError> {
        let plans = resources.database.list_plans_with_counts(auth.user_id).await?;
        let assignments = resources
            .database
            .list_assignments_for_trainer(auth.user_id)
            .await?;

        Ok(PageProps::respond(
            "TrainerDashboard",
            json!({
                "user": { "id": auth.user_id, "display_name": auth.display_name },
                "plans": plans,
                "assignments": assignments,
            }),
        ))
    }

    /// Admin dashboard: users per role and open alerts
    async fn handle_admin_dashboard(
        State(resources): State<Arc<ServerResources>>,
        Extension(auth): Extension<AuthResult>,
    ) -> Result<Response, AppError> {
        let users_by_role: BTreeMap<&'static str, i64> = resources
            .database
            .count_users_by_role()
            .await?
            .into_iter()
            .map(|(role, count)| (role.as_str(), count))
            .collect();
        let open_alerts = resources.database.count_open_alerts(Utc::now()).await?;

        Ok(PageProps::respond(
            "AdminDashboard",
            json!({
                "user": { "id": auth.user_id, "display_name": auth.display_name },
                "users_by_role": users_by_role,
                "open_safety_alerts": open_alerts,
            }),
        ))
    }
}
