// ABOUTME: Integration tests for own and public profiles, including avatar uploads
// ABOUTME: Public profiles carry follower counts and lifetime running totals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::TestApp;
use helpers::axum_test::{AxumTestRequest, MultipartPart};
use runclub_server::models::{Follow, UserRole};
use serde_json::{json, Value};

#[tokio::test]
async fn test_new_user_has_empty_profile() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("Runner", UserRole::Runner).await;

    let body: Value = AxumTestRequest::get("/api/profile")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert!(body["profile"]["bio"].is_null());
    assert!(body["profile"]["avatar_url"].is_null());
}

#[tokio::test]
async fn test_update_profile_and_validation() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Runner", UserRole::Runner).await;

    let profile: Value = AxumTestRequest::put("/api/profile")
        .bearer(&token)
        .json(&json!({
            "bio": "  Chasing a sub-20 5K  ",
            "location": "Portland",
            "experience_level": "intermediate",
            "weekly_goal_km": 40.0,
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["bio"], "Chasing a sub-20 5K");
    assert_eq!(profile["experience_level"], "intermediate");
    assert_eq!(profile["weekly_goal_km"], 40.0);

    let body: Value = AxumTestRequest::put("/api/profile")
        .bearer(&token)
        .json(&json!({ "experience_level": "legendary", "weekly_goal_km": -5.0 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    let fields = &body["error"]["details"]["fields"];
    assert!(fields["experience_level"].is_array());
    assert!(fields["weekly_goal_km"].is_array());
}

#[tokio::test]
async fn test_avatar_upload_survives_profile_edit() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Runner", UserRole::Runner).await;

    let profile: Value = AxumTestRequest::post("/api/profile/avatar")
        .bearer(&token)
        .multipart(&[MultipartPart::File {
            name: "avatar",
            filename: "me.webp",
            content_type: "image/webp",
            bytes: b"webp-bytes",
        }])
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let avatar_url = profile["avatar_url"].as_str().unwrap().to_owned();
    assert!(avatar_url.starts_with("/uploads/avatars/"));

    let profile: Value = AxumTestRequest::put("/api/profile")
        .bearer(&token)
        .json(&json!({ "bio": "New bio" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["avatar_url"], avatar_url);

    AxumTestRequest::post("/api/profile/avatar")
        .bearer(&token)
        .multipart(&[MultipartPart::File {
            name: "avatar",
            filename: "me.gif",
            content_type: "image/gif",
            bytes: b"gif-bytes",
        }])
        .send(app.router())
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_public_profile_counts() {
    let app = TestApp::new().await;
    let (subject, _) = app.create_user("Subject", UserRole::Runner).await;
    let (fan, fan_token) = app.create_user("Fan", UserRole::Runner).await;

    let follow = Follow::request(fan.id, subject.id);
    app.db().create_follow(&follow).await.unwrap();
    app.db().approve_follow(follow.id, chrono::Utc::now()).await.unwrap();
    app.create_run(subject.id, None, 5.0, 1500, 2).await;
    app.create_run(subject.id, None, 7.5, 2400, 1).await;

    let body: Value = AxumTestRequest::get(&format!("/api/users/{}/profile", subject.id))
        .bearer(&fan_token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["display_name"], "Subject");
    assert_eq!(body["follower_count"], 1);
    assert_eq!(body["following_count"], 0);
    assert_eq!(body["total_runs"], 2);
    assert_eq!(body["total_distance_km"], 12.5);
    assert!(body.get("email").is_none());
}
