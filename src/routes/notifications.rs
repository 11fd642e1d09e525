// ABOUTME: Notification route handlers: list, unread count, mark read, mark all read, delete
// ABOUTME: Only the owner may read, mark, or delete a notification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::AuthResult,
    constants::pagination::clamp_limit,
    errors::{AppError, AppResult},
    extract::{Json, Path, Query},
    models::Notification,
    resources::ServerResources,
};

/// Notification listing query
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
    /// Page size
    pub limit: Option<i64>,
}

/// Notification routes
pub struct NotificationRoutes;

impl NotificationRoutes {
    /// Create all notification routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/notifications", get(Self::handle_list))
            .route("/api/notifications/unread-count", get(Self::handle_unread_count))
            .route("/api/notifications/read-all", post(Self::handle_mark_all_read))
            .route("/api/notifications/:id/read", post(Self::handle_mark_read))
            .route("/api/notifications/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    async fn authenticate(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AuthResult> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(headers)
            .await
    }

    /// Load a notification owned by the caller; others' look missing
    async fn load_owned(resources: &ServerResources, auth: &AuthResult, id: Uuid) -> AppResult<Notification> {
        resources
            .database
            .get_notification(id)
            .await?
            .filter(|n| n.user_id == auth.user_id)
            .ok_or_else(|| AppError::not_found("Notification"))
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<NotificationQuery>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let notifications = resources
            .database
            .list_notifications(auth.user_id, query.unread_only, clamp_limit(query.limit))
            .await?;
        Ok((StatusCode::OK, Json(notifications)).into_response())
    }

    async fn handle_unread_count(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let count = resources.database.unread_notification_count(auth.user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "unread_count": count }))).into_response())
    }

    async fn handle_mark_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(notification_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let mut notification = Self::load_owned(&resources, &auth, notification_id).await?;

        if notification.read_at.is_none() {
            let now = Utc::now();
            resources
                .database
                .mark_notification_read(notification.id, now)
                .await?;
            notification.read_at = Some(now);
        }
        Ok((StatusCode::OK, Json(notification)).into_response())
    }

    async fn handle_mark_all_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let updated = resources
            .database
            .mark_all_notifications_read(auth.user_id, Utc::now())
            .await?;
        Ok((StatusCode::OK, Json(json!({ "marked_read": updated }))).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(notification_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let notification = Self::load_owned(&resources, &auth, notification_id).await?;

        resources.database.delete_notification(notification.id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
