// ABOUTME: Integration tests for role-based dashboard redirects and page props
// ABOUTME: Verifies each role lands on its own dashboard and guarded pages redirect strangers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::TestApp;
use helpers::axum_test::AxumTestRequest;
use runclub_server::models::{PlanAssignment, UserRole};
use serde_json::Value;

#[tokio::test]
async fn test_dashboard_redirects_by_stored_role() {
    let app = TestApp::new().await;

    for (name, role, expected) in [
        ("Runner", UserRole::Runner, "/runner/dashboard"),
        ("Trainer", UserRole::Trainer, "/trainer/dashboard"),
        ("Admin", UserRole::Admin, "/admin/dashboard"),
    ] {
        let (_, token) = app.create_user(name, role).await;
        let response = AxumTestRequest::get("/dashboard")
            .bearer(&token)
            .send(app.router())
            .await
            .assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location").as_deref(), Some(expected));
    }
}

#[tokio::test]
async fn test_dashboard_sends_anonymous_visitors_to_login() {
    let app = TestApp::new().await;

    for path in ["/dashboard", "/runner/dashboard", "/admin/dashboard"] {
        let response = AxumTestRequest::get(path)
            .send(app.router())
            .await
            .assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location").as_deref(), Some("/login"));
    }
}

#[tokio::test]
async fn test_role_pages_redirect_other_roles_home() {
    let app = TestApp::new().await;
    let (_, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let (_, trainer_token) = app.create_user("Trainer", UserRole::Trainer).await;

    let response = AxumTestRequest::get("/trainer/dashboard")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location").as_deref(), Some("/runner/dashboard"));

    let response = AxumTestRequest::get("/admin/dashboard")
        .bearer(&trainer_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location").as_deref(), Some("/trainer/dashboard"));
}

#[tokio::test]
async fn test_guarded_pages_surface_server_failures() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Runner", UserRole::Runner).await;
    app.db().pool().close().await;

    let body: Value = AxumTestRequest::get("/runner/dashboard")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .json();
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");

    // A garbage token is still a login problem, not a server one
    let response = AxumTestRequest::get("/runner/dashboard")
        .bearer("not-a-jwt")
        .send(app.router())
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location").as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_runner_dashboard_props() {
    let app = TestApp::new().await;
    let (trainer, _) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, token) = app.create_user("Runner", UserRole::Runner).await;

    let plan = app.create_plan(trainer.id, 2, 2, true).await;
    let assignment = PlanAssignment::new(plan.id, runner.id, trainer.id, chrono::Utc::now().date_naive());
    app.db().create_assignment(&assignment).await.unwrap();
    app.create_run(runner.id, None, 8.0, 2400, 0).await;

    let page: Value = AxumTestRequest::get("/runner/dashboard")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(page["component"], "RunnerDashboard");
    let props = &page["props"];
    assert_eq!(props["active_plan"]["plan"]["id"], plan.id.to_string());
    assert_eq!(props["active_plan"]["progress"]["total_workouts"], 4);
    assert_eq!(props["recent_runs"].as_array().unwrap().len(), 1);
    assert_eq!(props["recent_runs"][0]["pace_seconds_per_km"], 300.0);
    assert_eq!(props["month"]["totals"]["run_count"], 1);
    assert_eq!(props["achievements_earned"], 0);
}

#[tokio::test]
async fn test_trainer_dashboard_lists_plans_with_counts() {
    let app = TestApp::new().await;
    let (trainer, token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, _) = app.create_user("Runner", UserRole::Runner).await;

    let plan = app.create_plan(trainer.id, 1, 3, false).await;
    let assignment = PlanAssignment::new(plan.id, runner.id, trainer.id, chrono::Utc::now().date_naive());
    app.db().create_assignment(&assignment).await.unwrap();

    let page: Value = AxumTestRequest::get("/trainer/dashboard")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(page["component"], "TrainerDashboard");
    assert_eq!(page["props"]["plans"].as_array().unwrap().len(), 1);
    assert_eq!(page["props"]["assignments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_dashboard_counts_users() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Admin", UserRole::Admin).await;
    app.create_user("RunnerOne", UserRole::Runner).await;
    app.create_user("RunnerTwo", UserRole::Runner).await;

    let page: Value = AxumTestRequest::get("/admin/dashboard")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(page["component"], "AdminDashboard");
    assert_eq!(page["props"]["users_by_role"]["runner"], 2);
    assert_eq!(page["props"]["users_by_role"]["admin"], 1);
    assert_eq!(page["props"]["open_safety_alerts"], 0);
}
