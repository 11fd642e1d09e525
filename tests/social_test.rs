// ABOUTME: Integration tests for follow requests, approvals, follower lists, and the activity feed
// ABOUTME: Pending follows must stay invisible until the followed user approves them
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
use serde_json::Value;

async fn request_follow(app: &TestApp, token: &str, target: uuid::Uuid) -> Value {
    AxumTestRequest::post(&format!("/api/users/{target}/follow"))
        .bearer(token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json()
}

async fn follower_count(app: &TestApp, token: &str, user: uuid::Uuid) -> u64 {
    let body: Value = AxumTestRequest::get(&format!("/api/users/{user}/followers"))
        .bearer(token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    body["total"].as_u64().unwrap()
}

#[tokio::test]
async fn test_follow_starts_pending_and_notifies_target() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.create_user("Alice", UserRole::Runner).await;
    let (bob, bob_token) = app.create_user("Bob", UserRole::Runner).await;

    let follow = request_follow(&app, &alice_token, bob.id).await;
    assert_eq!(follow["status"], "pending");
    assert_eq!(follow["follower_id"], alice.id.to_string());
    assert!(follow["approved_at"].is_null());

    assert_eq!(follower_count(&app, &bob_token, bob.id).await, 0);

    let requests: Vec<Value> = AxumTestRequest::get("/api/follows/requests")
        .bearer(&bob_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["requester"]["display_name"], "Alice");

    let notifications = app.db().list_notifications(bob.id, true, 10).await.unwrap();
    assert!(notifications.iter().any(|n| n.kind == NotificationKind::FollowRequest));
}

#[tokio::test]
async fn test_follow_rejects_self_duplicates_and_unknown_users() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.create_user("Alice", UserRole::Runner).await;
    let (bob, _) = app.create_user("Bob", UserRole::Runner).await;

    AxumTestRequest::post(&format!("/api/users/{}/follow", alice.id))
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    request_follow(&app, &alice_token, bob.id).await;
    let body: Value = AxumTestRequest::post(&format!("/api/users/{}/follow", bob.id))
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");

    AxumTestRequest::post(&format!("/api/users/{}/follow", uuid::Uuid::new_v4()))
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_target_can_approve_and_only_once() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.create_user("Alice", UserRole::Runner).await;
    let (bob, bob_token) = app.create_user("Bob", UserRole::Runner).await;
    let (_, carol_token) = app.create_user("Carol", UserRole::Runner).await;

    let follow = request_follow(&app, &alice_token, bob.id).await;
    let approve_uri = format!("/api/follows/{}/approve", follow["id"].as_str().unwrap());

    for token in [&alice_token, &carol_token] {
        AxumTestRequest::post(&approve_uri)
            .bearer(token)
            .send(app.router())
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    let approved: Value = AxumTestRequest::post(&approve_uri)
        .bearer(&bob_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(approved["status"], "approved");
    assert!(approved["approved_at"].is_string());

    let body: Value = AxumTestRequest::post(&approve_uri)
        .bearer(&bob_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    assert_eq!(follower_count(&app, &bob_token, bob.id).await, 1);
    let following: Value = AxumTestRequest::get(&format!("/api/users/{}/following", alice.id))
        .bearer(&alice_token)
        .send(app.router())
        .await
        .json();
    assert_eq!(following["users"][0]["id"], bob.id.to_string());

    let notifications = app.db().list_notifications(alice.id, false, 10).await.unwrap();
    assert!(notifications.iter().any(|n| n.kind == NotificationKind::FollowApproved));
}

#[tokio::test]
async fn test_decline_removes_request_and_allows_retry() {
    let app = TestApp::new().await;
    let (_, alice_token) = app.create_user("Alice", UserRole::Runner).await;
    let (bob, bob_token) = app.create_user("Bob", UserRole::Runner).await;

    let follow = request_follow(&app, &alice_token, bob.id).await;
    AxumTestRequest::post(&format!("/api/follows/{}/decline", follow["id"].as_str().unwrap()))
        .bearer(&bob_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    request_follow(&app, &alice_token, bob.id).await;
}

#[tokio::test]
async fn test_unfollow_removes_edge() {
    let app = TestApp::new().await;
    let (_, alice_token) = app.create_user("Alice", UserRole::Runner).await;
    let (bob, _) = app.create_user("Bob", UserRole::Runner).await;
    let uri = format!("/api/users/{}/follow", bob.id);

    request_follow(&app, &alice_token, bob.id).await;
    AxumTestRequest::delete(&uri)
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    AxumTestRequest::delete(&uri)
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_shows_own_and_approved_follows_only() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.create_user("Alice", UserRole::Runner).await;
    let (bob, bob_token) = app.create_user("Bob", UserRole::Runner).await;
    let (carol, _) = app.create_user("Carol", UserRole::Runner).await;

    app.create_run(alice.id, None, 5.0, 1500, 3).await;
    app.create_run(bob.id, None, 10.0, 3000, 2).await;
    app.create_run(carol.id, None, 7.0, 2100, 1).await;

    // Bob approves Alice, Carol never answers
    let follow = request_follow(&app, &alice_token, bob.id).await;
    AxumTestRequest::post(&format!("/api/users/{}/follow", carol.id))
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);
    AxumTestRequest::post(&format!("/api/follows/{}/approve", follow["id"].as_str().unwrap()))
        .bearer(&bob_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let feed: Value = AxumTestRequest::get("/api/feed")
        .bearer(&alice_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let names: Vec<&str> = feed["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["display_name"].as_str())
        .collect();
    assert_eq!(names, vec!["Bob", "Alice"]);
    assert_eq!(feed["has_more"], false);
    assert!(feed["next_cursor"].is_null());
}

#[tokio::test]
async fn test_feed_cursor_pagination() {
    let app = TestApp::new().await;
    let (runner, token) = app.create_user("Runner", UserRole::Runner).await;
    for days_ago in 0..3 {
        app.create_run(runner.id, None, 5.0, 1500, days_ago).await;
    }

    let first: Value = AxumTestRequest::get("/api/feed?limit=2")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(first["count"], 2);
    assert_eq!(first["has_more"], true);
    let cursor = first["next_cursor"].as_str().unwrap();

    let second: Value = AxumTestRequest::get(&format!("/api/feed?limit=2&cursor={cursor}"))
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(second["count"], 1);
    assert_eq!(second["has_more"], false);

    // "nope" has no position separator
    AxumTestRequest::get("/api/feed?cursor=bm9wZQ")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
