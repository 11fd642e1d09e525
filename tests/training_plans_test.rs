// ABOUTME: Integration tests for training plan authoring, assignment, and progress tracking
// ABOUTME: Covers the one-active-assignment rule, workout completion math, and status transitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{weekly_structure, TestApp};
use helpers::axum_test::AxumTestRequest;
use runclub_server::models::{NotificationKind, UserRole};
use serde_json::{json, Value};

fn plan_body(title: &str, is_public: bool) -> Value {
    json!({
        "title": title,
        "description": "Six weeks of structured running",
        "difficulty": "beginner",
        "duration_weeks": 2,
        "weekly_structure": weekly_structure(2, 2),
        "is_public": is_public,
    })
}

async fn assign(app: &TestApp, trainer_token: &str, plan_id: &str, runner_id: &str) -> Value {
    AxumTestRequest::post(&format!("/api/plans/{plan_id}/assign"))
        .bearer(trainer_token)
        .json(&json!({ "runner_id": runner_id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json()
}

#[tokio::test]
async fn test_trainer_creates_plan_and_runner_cannot() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (_, runner_token) = app.create_user("Runner", UserRole::Runner).await;

    let plan: Value = AxumTestRequest::post("/api/plans")
        .bearer(&trainer_token)
        .json(&plan_body("Couch to 5K", true))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(plan["trainer_id"], trainer.id.to_string());
    assert_eq!(plan["weekly_structure"]["weeks"].as_array().unwrap().len(), 2);

    let body: Value = AxumTestRequest::post("/api/plans")
        .bearer(&runner_token)
        .json(&plan_body("Runner plan", true))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .json();
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_plan_structure_must_fit_duration() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Coach", UserRole::Trainer).await;

    let mut body = plan_body("Too long", true);
    body["weekly_structure"] = json!(weekly_structure(3, 1));

    let response: Value = AxumTestRequest::post("/api/plans")
        .bearer(&token)
        .json(&body)
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    assert!(response["error"]["details"]["fields"]["weekly_structure"].is_array());
}

#[tokio::test]
async fn test_private_plans_hidden_from_other_users() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (_, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let private = app.create_plan(trainer.id, 1, 1, false).await;
    let public = app.create_plan(trainer.id, 1, 1, true).await;

    let plans: Vec<Value> = AxumTestRequest::get("/api/plans")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let ids: Vec<&str> = plans.iter().filter_map(|p| p["id"].as_str()).collect();
    assert!(ids.contains(&public.id.to_string().as_str()));
    assert!(!ids.contains(&private.id.to_string().as_str()));

    AxumTestRequest::get(&format!("/api/plans/{}", private.id))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::get(&format!("/api/plans/{}", private.id))
        .bearer(&trainer_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_only_owner_edits_plan() {
    let app = TestApp::new().await;
    let (trainer, _) = app.create_user("Coach", UserRole::Trainer).await;
    let (_, other_token) = app.create_user("OtherCoach", UserRole::Trainer).await;
    let plan = app.create_plan(trainer.id, 2, 2, true).await;

    AxumTestRequest::put(&format!("/api/plans/{}", plan.id))
        .bearer(&other_token)
        .json(&plan_body("Hijacked", true))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::delete(&format!("/api/plans/{}", plan.id))
        .bearer(&other_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_assignment_notifies_runner_and_blocks_second_active() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let first = app.create_plan(trainer.id, 2, 2, true).await;
    let second = app.create_plan(trainer.id, 2, 2, true).await;

    let detail = assign(&app, &trainer_token, &first.id.to_string(), &runner.id.to_string()).await;
    assert_eq!(detail["assignment"]["status"], "active");
    assert_eq!(detail["progress"]["completion_percentage"], 0.0);

    let notifications = app.db().list_notifications(runner.id, false, 10).await.unwrap();
    assert!(notifications.iter().any(|n| n.kind == NotificationKind::PlanAssigned));

    let body: Value = AxumTestRequest::post(&format!("/api/plans/{}/assign", second.id))
        .bearer(&trainer_token)
        .json(&json!({ "runner_id": runner.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");

    AxumTestRequest::post(&format!("/api/plans/{}/enroll", second.id))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_plans_only_assign_to_runners() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (other_trainer, _) = app.create_user("OtherCoach", UserRole::Trainer).await;
    let plan = app.create_plan(trainer.id, 1, 1, true).await;

    AxumTestRequest::post(&format!("/api/plans/{}/assign", plan.id))
        .bearer(&trainer_token)
        .json(&json!({ "runner_id": other_trainer.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_runner_self_enrolls_in_public_plan_only() {
    let app = TestApp::new().await;
    let (trainer, _) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, token) = app.create_user("Runner", UserRole::Runner).await;
    let private = app.create_plan(trainer.id, 1, 1, false).await;
    let public = app.create_plan(trainer.id, 1, 1, true).await;

    AxumTestRequest::post(&format!("/api/plans/{}/enroll", private.id))
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let detail: Value = AxumTestRequest::post(&format!("/api/plans/{}/enroll", public.id))
        .bearer(&token)
        .json(&json!({ "start_date": "2026-01-05" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(detail["assignment"]["runner_id"], runner.id.to_string());
    assert_eq!(detail["assignment"]["assigned_by"], runner.id.to_string());
    assert_eq!(detail["assignment"]["start_date"], "2026-01-05");
}

#[tokio::test]
async fn test_workout_completion_drives_progress_to_completed() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let plan = app.create_plan(trainer.id, 1, 3, true).await;

    let detail = assign(&app, &trainer_token, &plan.id.to_string(), &runner.id.to_string()).await;
    let assignment_id = detail["assignment"]["id"].as_str().unwrap().to_owned();
    let workout_uri = |index: u32| format!("/api/assignments/{assignment_id}/workouts/1/{index}");

    let detail: Value = AxumTestRequest::post(&workout_uri(0))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["assignment"]["completion_percentage"], 33.33);

    // Completing the same workout twice changes nothing
    let detail: Value = AxumTestRequest::post(&workout_uri(0))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .json();
    assert_eq!(detail["progress"]["completed_workouts"], 1);

    let detail: Value = AxumTestRequest::delete(&workout_uri(0))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["assignment"]["completion_percentage"], 0.0);

    for index in 0..3 {
        AxumTestRequest::post(&workout_uri(index))
            .bearer(&runner_token)
            .send(app.router())
            .await
            .assert_status(StatusCode::OK);
    }

    let detail: Value = AxumTestRequest::get(&format!("/api/assignments/{assignment_id}"))
        .bearer(&trainer_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["assignment"]["status"], "completed");
    assert_eq!(detail["assignment"]["completion_percentage"], 100.0);
    assert!(detail["assignment"]["completed_at"].is_string());

    // Completed assignments are frozen
    AxumTestRequest::delete(&workout_uri(1))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_workout_is_not_found() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let plan = app.create_plan(trainer.id, 1, 1, true).await;
    let detail = assign(&app, &trainer_token, &plan.id.to_string(), &runner.id.to_string()).await;
    let assignment_id = detail["assignment"]["id"].as_str().unwrap();

    AxumTestRequest::post(&format!("/api/assignments/{assignment_id}/workouts/4/0"))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_transitions_follow_lifecycle() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let (_, stranger_token) = app.create_user("Stranger", UserRole::Runner).await;
    let plan = app.create_plan(trainer.id, 2, 2, true).await;
    let detail = assign(&app, &trainer_token, &plan.id.to_string(), &runner.id.to_string()).await;
    let status_uri = format!(
        "/api/assignments/{}/status",
        detail["assignment"]["id"].as_str().unwrap()
    );

    AxumTestRequest::post(&status_uri)
        .bearer(&stranger_token)
        .json(&json!({ "action": "pause" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let paused: Value = AxumTestRequest::post(&status_uri)
        .bearer(&runner_token)
        .json(&json!({ "action": "pause" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(paused["assignment"]["status"], "paused");
    assert!(paused["assignment"]["paused_at"].is_string());

    // Paused assignments cannot be completed directly
    AxumTestRequest::post(&status_uri)
        .bearer(&runner_token)
        .json(&json!({ "action": "complete" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    let resumed: Value = AxumTestRequest::post(&status_uri)
        .bearer(&trainer_token)
        .json(&json!({ "action": "resume" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(resumed["assignment"]["status"], "active");
    assert!(resumed["assignment"]["paused_at"].is_null());

    AxumTestRequest::post(&status_uri)
        .bearer(&runner_token)
        .json(&json!({ "action": "abandon" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let body: Value = AxumTestRequest::post(&status_uri)
        .bearer(&runner_token)
        .json(&json!({ "action": "resume" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_abandoned_assignment_frees_runner_for_new_plan() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let first = app.create_plan(trainer.id, 1, 1, true).await;
    let second = app.create_plan(trainer.id, 1, 1, true).await;

    let detail = assign(&app, &trainer_token, &first.id.to_string(), &runner.id.to_string()).await;
    AxumTestRequest::post(&format!(
        "/api/assignments/{}/status",
        detail["assignment"]["id"].as_str().unwrap()
    ))
    .bearer(&runner_token)
    .json(&json!({ "action": "abandon" }))
    .send(app.router())
    .await
    .assert_status(StatusCode::OK);

    AxumTestRequest::post(&format!("/api/plans/{}/enroll", second.id))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);

    let assignments: Vec<Value> = AxumTestRequest::get("/api/assignments")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(assignments.len(), 2);
}

#[tokio::test]
async fn test_trainer_assignment_listing() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let plan = app.create_plan(trainer.id, 1, 1, true).await;
    assign(&app, &trainer_token, &plan.id.to_string(), &runner.id.to_string()).await;

    let rows: Vec<Value> = AxumTestRequest::get("/api/trainer/assignments")
        .bearer(&trainer_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["runner_name"], "Runner");
    assert_eq!(rows[0]["plan_title"], plan.title);

    AxumTestRequest::get("/api/trainer/assignments")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_trimming_a_plan_recomputes_active_assignments() {
    let app = TestApp::new().await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let plan = app.create_plan(trainer.id, 1, 3, true).await;

    let detail = assign(&app, &trainer_token, &plan.id.to_string(), &runner.id.to_string()).await;
    let assignment_id = detail["assignment"]["id"].as_str().unwrap().to_owned();
    for index in 0..2 {
        AxumTestRequest::post(&format!("/api/assignments/{assignment_id}/workouts/1/{index}"))
            .bearer(&runner_token)
            .send(app.router())
            .await
            .assert_status(StatusCode::OK);
    }

    let mut trimmed = plan_body("Spring 10K", true);
    trimmed["duration_weeks"] = json!(1);
    trimmed["weekly_structure"] = json!(weekly_structure(1, 2));
    AxumTestRequest::put(&format!("/api/plans/{}", plan.id))
        .bearer(&trainer_token)
        .json(&trimmed)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let progress: Value = AxumTestRequest::get(&format!("/api/assignments/{assignment_id}/progress"))
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(progress["total_workouts"], 2);
    assert_eq!(progress["completed_workouts"], 2);
    assert_eq!(progress["completion_percentage"], 100.0);
    assert_eq!(progress["status"], "completed");

    // Growing the plan again leaves the completed assignment frozen
    AxumTestRequest::put(&format!("/api/plans/{}", plan.id))
        .bearer(&trainer_token)
        .json(&plan_body("Spring 10K", true))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    let detail: Value = AxumTestRequest::get(&format!("/api/assignments/{assignment_id}"))
        .bearer(&trainer_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["assignment"]["status"], "completed");
}

#[tokio::test]
async fn test_enroll_rejects_unreadable_start_dates() {
    let app = TestApp::new().await;
    let (trainer, _) = app.create_user("Coach", UserRole::Trainer).await;
    let (_, token) = app.create_user("Runner", UserRole::Runner).await;
    let plan = app.create_plan(trainer.id, 1, 1, true).await;
    let uri = format!("/api/plans/{}/enroll", plan.id);

    let body: Value = AxumTestRequest::post(&uri)
        .bearer(&token)
        .json(&json!({ "start_date": "2026-02-31" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(body["error"]["details"]["fields"]["start_date"].is_array());

    AxumTestRequest::post(&uri)
        .bearer(&token)
        .json(&json!({ "start_date": 20_260_105 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = AxumTestRequest::post(&uri)
        .bearer(&token)
        .json(&json!(["2026-01-05"]))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    // Nothing was enrolled by the rejected attempts
    let detail: Value = AxumTestRequest::post(&uri)
        .bearer(&token)
        .json(&json!({ "start_date": null }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(detail["assignment"]["status"], "active");
}
