// ABOUTME: Integration tests for running routes: catalog, ratings, photos, and leaderboards
// ABOUTME: Photo uploads go through multipart into a temporary upload directory
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
use runclub_server::models::UserRole;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_filter_routes() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("Runner", UserRole::Runner).await;

    let route: Value = AxumTestRequest::post("/api/routes")
        .bearer(&token)
        .json(&json!({
            "name": "  Hill Loop ",
            "distance_km": 8.5,
            "elevation_gain_m": 220.0,
            "difficulty": "hard",
            "surface": "trail",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(route["name"], "Hill Loop");
    assert_eq!(route["creator_id"], user.id.to_string());
    assert_eq!(route["rating_count"], 0);
    assert!(route["average_rating"].is_null());

    app.create_route(user.id, "Riverside").await;

    let trails: Vec<Value> = AxumTestRequest::get("/api/routes?surface=trail")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(trails.len(), 1);
    assert_eq!(trails[0]["name"], "Hill Loop");

    let all: Vec<Value> = AxumTestRequest::get("/api/routes")
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("Runner", UserRole::Runner).await;

    AxumTestRequest::get(&format!("/api/routes/{}", Uuid::new_v4()))
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_upsert_keeps_one_row_per_user() {
    let app = TestApp::new().await;
    let (creator, token) = app.create_user("Creator", UserRole::Runner).await;
    let (_, other_token) = app.create_user("Other", UserRole::Runner).await;
    let route = app.create_route(creator.id, "Harbor Loop").await;
    let uri = format!("/api/routes/{}/ratings", route.id);

    for (token, rating) in [(&token, 2), (&token, 4), (&other_token, 5)] {
        AxumTestRequest::post(&uri)
            .bearer(token)
            .json(&json!({ "rating": rating, "review": "Nice views" }))
            .send(app.router())
            .await
            .assert_status(StatusCode::OK);
    }

    let detail: Value = AxumTestRequest::get(&format!("/api/routes/{}", route.id))
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(detail["rating_count"], 2);
    assert_eq!(detail["average_rating"], 4.5);

    let body: Value = AxumTestRequest::post(&uri)
        .bearer(&token)
        .json(&json!({ "rating": 6 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .json();
    assert!(body["error"]["details"]["fields"]["rating"].is_array());
}

#[tokio::test]
async fn test_leaderboard_keeps_best_time_per_runner() {
    let app = TestApp::new().await;
    let (creator, token) = app.create_user("Creator", UserRole::Runner).await;
    let (fast, _) = app.create_user("Fast", UserRole::Runner).await;
    let (steady, _) = app.create_user("Steady", UserRole::Runner).await;
    let route = app.create_route(creator.id, "Track").await;
    let other_route = app.create_route(creator.id, "Elsewhere").await;

    app.create_run(fast.id, Some(route.id), 5.0, 1300, 3).await;
    let best = app.create_run(fast.id, Some(route.id), 5.0, 1200, 2).await;
    app.create_run(steady.id, Some(route.id), 5.0, 1500, 1).await;
    app.create_run(steady.id, Some(other_route.id), 5.0, 1000, 1).await;

    let board: Value = AxumTestRequest::get(&format!("/api/routes/{}/leaderboard", route.id))
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let entries = board["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["display_name"], "Fast");
    assert_eq!(entries[0]["run_id"], best.id.to_string());
    assert_eq!(entries[0]["duration_seconds"], 1200);
    assert_eq!(entries[1]["display_name"], "Steady");
    assert_eq!(entries[1]["duration_seconds"], 1500);

    let top: Value = AxumTestRequest::get(&format!("/api/routes/{}/leaderboard?limit=1", route.id))
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(top["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_photo_upload_is_stored_and_served() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("Photographer", UserRole::Runner).await;
    let route = app.create_route(user.id, "Sunrise Loop").await;

    let photo: Value = AxumTestRequest::post(&format!("/api/routes/{}/photos", route.id))
        .bearer(&token)
        .multipart(&[
            MultipartPart::Text {
                name: "caption",
                value: "Morning fog",
            },
            MultipartPart::File {
                name: "photo",
                filename: "fog.png",
                content_type: "image/png",
                bytes: b"not-really-a-png",
            },
        ])
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(photo["caption"], "Morning fog");
    let url = photo["url"].as_str().unwrap().to_owned();
    assert!(url.starts_with("/uploads/route_photos/"));
    assert!(url.ends_with(".png"));

    let served = AxumTestRequest::get(&url)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(served.text(), "not-really-a-png");

    let photos: Vec<Value> = AxumTestRequest::get(&format!("/api/routes/{}/photos", route.id))
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(photos.len(), 1);
}

#[tokio::test]
async fn test_photo_upload_rejects_non_images_and_oversize() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("Photographer", UserRole::Runner).await;
    let route = app.create_route(user.id, "Sunrise Loop").await;
    let uri = format!("/api/routes/{}/photos", route.id);

    let body: Value = AxumTestRequest::post(&uri)
        .bearer(&token)
        .multipart(&[MultipartPart::File {
            name: "photo",
            filename: "notes.txt",
            content_type: "text/plain",
            bytes: b"hello",
        }])
        .send(app.router())
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        .json();
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");

    let oversized = vec![b'x'; 1024 * 1024 + 1];
    AxumTestRequest::post(&uri)
        .bearer(&token)
        .multipart(&[MultipartPart::File {
            name: "photo",
            filename: "huge.jpg",
            content_type: "image/jpeg",
            bytes: &oversized,
        }])
        .send(app.router())
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    AxumTestRequest::post(&uri)
        .bearer(&token)
        .multipart(&[MultipartPart::Text {
            name: "caption",
            value: "No file",
        }])
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
