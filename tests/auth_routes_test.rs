// ABOUTME: Integration tests for registration, login, logout, and the current user endpoint
// ABOUTME: Covers cookie and Bearer sessions, role validation, and uniform login failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{TestApp, TEST_PASSWORD};
use helpers::axum_test::AxumTestRequest;
use runclub_server::models::UserRole;
use serde_json::{json, Value};

fn registration(email: &str, role: Option<&str>) -> Value {
    let mut body = json!({
        "email": email,
        "password": "a-long-password",
        "display_name": "Jamie Runner",
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    body
}

#[tokio::test]
async fn test_register_sets_cookie_and_returns_token() {
    let app = TestApp::new().await;

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&registration("Jamie@Example.com", None))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);

    let cookie = response.header("set-cookie").expect("session cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "jamie@example.com");
    assert_eq!(body["user"]["role"], "runner");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_register_as_trainer_and_reject_admin() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::post("/api/auth/register")
        .json(&registration("coach@example.com", Some("trainer")))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(body["user"]["role"], "trainer");

    let body: Value = AxumTestRequest::post("/api/auth/register")
        .json(&registration("boss@example.com", Some("admin")))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(body["error"]["details"]["fields"]["role"].is_array());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new().await;

    AxumTestRequest::post("/api/auth/register")
        .json(&registration("dup@example.com", None))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = AxumTestRequest::post("/api/auth/register")
        .json(&registration("DUP@example.com", None))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_validation_reports_each_field() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "short", "display_name": "" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    let fields = &body["error"]["details"]["fields"];
    assert!(fields["email"].is_array());
    assert!(fields["password"].is_array());
    assert!(fields["display_name"].is_array());
}

#[tokio::test]
async fn test_login_then_me_with_cookie() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("Casey", UserRole::Runner).await;

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_owned();

    let me: Value = AxumTestRequest::get("/api/auth/me")
        .cookie("auth_token", &token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(me["id"], user.id.to_string());
    assert!(me["last_login_at"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("Drew", UserRole::Runner).await;
    let (inactive, _) = app.create_user("Eli", UserRole::Runner).await;
    app.db().set_user_active(inactive.id, false).await.unwrap();

    let attempts = [
        json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
        json!({ "email": user.email, "password": "wrong-password" }),
        json!({ "email": inactive.email, "password": TEST_PASSWORD }),
    ];

    let mut messages = Vec::new();
    for attempt in &attempts {
        let body: Value = AxumTestRequest::post("/api/auth/login")
            .json(attempt)
            .send(app.router())
            .await
            .assert_status(StatusCode::UNAUTHORIZED)
            .json();
        assert_eq!(body["error"]["code"], "AUTH_INVALID");
        messages.push(body["error"]["message"].clone());
    }
    assert!(messages.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::get("/api/auth/me")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    AxumTestRequest::get("/api/auth/me")
        .bearer("not-a-jwt")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_user_token_is_rejected() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("Frankie", UserRole::Runner).await;
    app.db().set_user_active(user.id, false).await.unwrap();

    AxumTestRequest::get("/api/auth/me")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;

    let response = AxumTestRequest::post("/api/auth/logout")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    let cookie = response.header("set-cookie").expect("clearing cookie");
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new().await;

    let health: Value = AxumTestRequest::get("/health")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(health["status"], "healthy");

    let ready: Value = AxumTestRequest::get("/ready")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(ready["database"], "ok");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new().await;

    let response = AxumTestRequest::get("/health").send(app.router()).await;
    assert!(response.header("x-request-id").is_some());
}
