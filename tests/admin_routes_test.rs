// ABOUTME: Integration tests for admin account management routes
// ABOUTME: Validates role changes, deactivation, self-protection, and admin-only access
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
use runclub_server::models::UserRole;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_admin_changes_role_and_redirect_follows() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_user("Admin", UserRole::Admin).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;

    let user: Value = AxumTestRequest::put(&format!("/api/admin/users/{}/role", runner.id))
        .bearer(&admin_token)
        .json(&json!({ "role": "trainer" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(user["role"], "trainer");
    assert!(user.get("password_hash").is_none());

    // The stored role wins over whatever the old token said
    let response = AxumTestRequest::get("/dashboard")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location").as_deref(), Some("/trainer/dashboard"));
}

#[tokio::test]
async fn test_deactivation_locks_user_out_and_reactivation_restores() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_user("Admin", UserRole::Admin).await;
    let (runner, runner_token) = app.create_user("Runner", UserRole::Runner).await;
    let uri = format!("/api/admin/users/{}/active", runner.id);

    let user: Value = AxumTestRequest::put(&uri)
        .bearer(&admin_token)
        .json(&json!({ "is_active": false }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(user["is_active"], false);

    AxumTestRequest::get("/api/auth/me")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    AxumTestRequest::put(&uri)
        .bearer(&admin_token)
        .json(&json!({ "is_active": true }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::get("/api/auth/me")
        .bearer(&runner_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cannot_modify_own_account() {
    let app = TestApp::new().await;
    let (admin, admin_token) = app.create_user("Admin", UserRole::Admin).await;

    AxumTestRequest::put(&format!("/api/admin/users/{}/role", admin.id))
        .bearer(&admin_token)
        .json(&json!({ "role": "runner" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::put(&format!("/api/admin/users/{}/active", admin.id))
        .bearer(&admin_token)
        .json(&json!({ "is_active": false }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new().await;
    let (_, trainer_token) = app.create_user("Coach", UserRole::Trainer).await;
    let (runner, _) = app.create_user("Runner", UserRole::Runner).await;

    let body: Value = AxumTestRequest::put(&format!("/api/admin/users/{}/role", runner.id))
        .bearer(&trainer_token)
        .json(&json!({ "role": "admin" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .json();
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

    AxumTestRequest::put(&format!("/api/admin/users/{}/active", runner.id))
        .json(&json!({ "is_active": false }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_user("Admin", UserRole::Admin).await;

    AxumTestRequest::put(&format!("/api/admin/users/{}/role", Uuid::new_v4()))
        .bearer(&admin_token)
        .json(&json!({ "role": "trainer" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
