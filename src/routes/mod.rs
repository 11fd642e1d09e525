// ABOUTME: Route module organization for the RunClub HTTP endpoints
// ABOUTME: Merges the per-domain routers and applies the shared HTTP layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the RunClub server
//!
//! Each domain module exposes a `XRoutes::routes(resources)` constructor
//! returning a stateless [`Router`]. [`build_router`] merges them, serves the
//! upload directory, and wraps everything in request ids, tracing, CORS, a
//! timeout, and a body limit sized for uploads.

/// Achievement definitions and earned achievements
pub mod achievements;
/// Admin user management
pub mod admin;
/// Registration, login, logout, current user
pub mod auth;
/// Role-gated dashboard pages
pub mod dashboard;
/// Forum posts, comments, and likes
pub mod forum;
/// Liveness and readiness
pub mod health;
/// Direct messages
pub mod messages;
/// In-app notifications
pub mod notifications;
/// Profiles and avatars
pub mod profiles;
/// Logged runs
pub mod runs;
/// Running routes, ratings, photos, and leaderboards
pub mod running_routes;
/// Safety alerts
pub mod safety;
/// Follow graph and activity feed
pub mod social;
/// Training plans and assignments
pub mod training_plans;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::errors::{AppError, AppResult};
use crate::middleware::{request_id_layers, setup_cors, trace_layer};
use crate::resources::ServerResources;
use crate::storage::{validate_image, PUBLIC_PREFIX};

/// Multipart framing allowance on top of the configured upload size
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub use achievements::AchievementRoutes;
pub use admin::AdminRoutes;
pub use auth::AuthRoutes;
pub use dashboard::DashboardRoutes;
pub use forum::ForumRoutes;
pub use health::HealthRoutes;
pub use messages::MessageRoutes;
pub use notifications::NotificationRoutes;
pub use profiles::ProfileRoutes;
pub use runs::RunRoutes;
pub use running_routes::RunningRouteRoutes;
pub use safety::SafetyRoutes;
pub use social::SocialRoutes;
pub use training_plans::TrainingPlanRoutes;

/// Build the complete application router
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();
    let body_limit = resources.config.uploads.max_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(DashboardRoutes::routes(resources))
        .merge(AdminRoutes::routes(resources.clone()))
        .merge(ProfileRoutes::routes(resources.clone()))
        .merge(TrainingPlanRoutes::routes(resources.clone()))
        .merge(RunRoutes::routes(resources.clone()))
        .merge(RunningRouteRoutes::routes(resources.clone()))
        .merge(SocialRoutes::routes(resources.clone()))
        .merge(ForumRoutes::routes(resources.clone()))
        .merge(NotificationRoutes::routes(resources.clone()))
        .merge(MessageRoutes::routes(resources.clone()))
        .merge(AchievementRoutes::routes(resources.clone()))
        .merge(SafetyRoutes::routes(resources.clone()))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(resources.storage.root()))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id)
                .layer(trace_layer())
                .layer(propagate_request_id)
                .layer(setup_cors(&resources.config))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    resources.config.request_timeout_secs,
                )))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Map a multipart read failure, keeping the body-limit rejection as 413
pub(crate) fn multipart_error(error: &MultipartError, max_bytes: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large(max_bytes)
    } else {
        AppError::invalid_input(format!("Invalid multipart body: {error}"))
    }
}

/// Read a multipart field as UTF-8 text
pub(crate) async fn field_text(field: Field<'_>, max_bytes: usize) -> AppResult<String> {
    field.text().await.map_err(|e| multipart_error(&e, max_bytes))
}

/// Validated image bytes read from a multipart field
pub(crate) struct ImageUpload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Read a multipart field as an image upload
pub(crate) async fn read_image(field: Field<'_>, max_bytes: usize) -> AppResult<ImageUpload> {
    let content_type = field.content_type().map(str::to_owned);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| multipart_error(&e, max_bytes))?;
    let extension = validate_image(content_type.as_deref(), bytes.len(), max_bytes)?;
    Ok(ImageUpload {
        bytes: bytes.to_vec(),
        extension,
    })
}
