// ABOUTME: Integration tests for safety alerts: reporting, route fan-out, listing, and resolution
// ABOUTME: Only runners active on the route in the last 30 days are notified
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
use runclub_server::models::{NotificationKind, UserRole};
use serde_json::{json, Value};
use uuid::Uuid;

fn alert_body(route_id: Option<Uuid>) -> Value {
    json!({
        "alert_type": "trail_hazard",
        "severity": "high",
        "title": "Fallen tree across the path",
        "description": "Just past the second bridge",
        "route_id": route_id,
    })
}

#[tokio::test]
async fn test_route_alert_notifies_recent_runners() {
    let app = TestApp::new().await;
    let (reporter, reporter_token) = app.create_user("Reporter", UserRole::Runner).await;
    let (recent, _) = app.create_user("Recent", UserRole::Runner).await;
    let (stale, _) = app.create_user("Stale", UserRole::Runner).await;
    let route = app.create_route(reporter.id, "Forest Loop").await;

    app.create_run(reporter.id, Some(route.id), 5.0, 1600, 1).await;
    app.create_run(recent.id, Some(route.id), 5.0, 1700, 5).await;
    app.create_run(stale.id, Some(route.id), 5.0, 1800, 45).await;

    let body: Value = AxumTestRequest::post("/api/safety-alerts")
        .bearer(&reporter_token)
        .json(&alert_body(Some(route.id)))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(body["notified_users"], 1);
    assert_eq!(body["alert"]["severity"], "high");
    assert!(body["alert"]["resolved_at"].is_null());

    let recent_notes = app.db().list_notifications(recent.id, false, 10).await.unwrap();
    assert!(recent_notes.iter().any(|n| n.kind == NotificationKind::SafetyAlert));
    assert!(app.db().list_notifications(stale.id, false, 10).await.unwrap().is_empty());
    assert!(app.db().list_notifications(reporter.id, false, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_alert_validation_and_unknown_route() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Reporter", UserRole::Runner).await;

    let body: Value = AxumTestRequest::post("/api/safety-alerts")
        .bearer(&token)
        .json(&json!({
            "alert_type": "weather",
            "severity": "low",
            "title": "Ice",
            "latitude": 95.0,
            "expires_at": "2000-01-01T00:00:00Z",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    let fields = &body["error"]["details"]["fields"];
    assert!(fields["latitude"].is_array());
    assert!(fields["expires_at"].is_array());

    AxumTestRequest::post("/api/safety-alerts")
        .bearer(&token)
        .json(&alert_body(Some(Uuid::new_v4())))
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_active_alerts_filters_by_route() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("Reporter", UserRole::Runner).await;
    let route = app.create_route(user.id, "Canal Path").await;

    for route_id in [Some(route.id), None] {
        AxumTestRequest::post("/api/safety-alerts")
            .bearer(&token)
            .json(&alert_body(route_id))
            .send(app.router())
            .await
            .assert_status(StatusCode::CREATED);
    }

    let all: Vec<Value> = AxumTestRequest::get("/api/safety-alerts")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(all.len(), 2);

    let on_route: Vec<Value> = AxumTestRequest::get(&format!("/api/safety-alerts?route_id={}", route.id))
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(on_route.len(), 1);
    assert_eq!(on_route[0]["route_id"], route.id.to_string());
}

#[tokio::test]
async fn test_resolve_permissions_and_state() {
    let app = TestApp::new().await;
    let (_, reporter_token) = app.create_user("Reporter", UserRole::Runner).await;
    let (_, stranger_token) = app.create_user("Stranger", UserRole::Runner).await;
    let (trainer, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;

    let created: Value = AxumTestRequest::post("/api/safety-alerts")
        .bearer(&reporter_token)
        .json(&alert_body(None))
        .send(app.router())
        .await
        .json();
    assert_eq!(created["notified_users"], 0);
    let resolve_uri = format!(
        "/api/safety-alerts/{}/resolve",
        created["alert"]["id"].as_str().unwrap()
    );

    AxumTestRequest::post(&resolve_uri)
        .bearer(&stranger_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let resolved: Value = AxumTestRequest::post(&resolve_uri)
        .bearer(&trainer_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(resolved["resolved_at"].is_string());
    assert_eq!(resolved["resolved_by"], trainer.id.to_string());

    let body: Value = AxumTestRequest::post(&resolve_uri)
        .bearer(&reporter_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let active: Vec<Value> = AxumTestRequest::get("/api/safety-alerts")
        .bearer(&reporter_token)
        .send(app.router())
        .await
        .json();
    assert!(active.is_empty());
}
