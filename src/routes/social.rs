// ABOUTME: Route handlers for the follow graph and the activity feed
// ABOUTME: Follow requests start pending and only the target can approve or decline them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Social routes
//!
//! A follow is a directed edge from follower to followed user. Edges begin
//! `pending`; only approved edges appear in follower lists and feed the
//! activity feed. All endpoints require authentication.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthResult,
    errors::{AppError, AppResult},
    extract::{Json, Path, Query},
    logging::AppLogger,
    models::{FeedItem, Follow, FollowStatus, UserSummary},
    pagination::{CursorPage, PaginationParams},
    resources::ServerResources,
    services::notifications::Notifier,
};

// ============================================================================
// Request / Response Types
// ============================================================================

/// Cursor pagination query
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Opaque cursor from the previous page
    pub cursor: Option<String>,
    /// Page size
    pub limit: Option<i64>,
}

/// Incoming follow request with the requester
#[derive(Debug, Serialize)]
pub struct FollowRequestView {
    /// The pending edge
    #[serde(flatten)]
    pub follow: Follow,
    /// Who asked to follow
    pub requester: UserSummary,
}

/// User list response
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    /// Users in the list
    pub users: Vec<UserSummary>,
    /// Number of users
    pub total: usize,
}

// ============================================================================
// Routes
// ============================================================================

/// Social routes
pub struct SocialRoutes;

impl SocialRoutes {
    /// Create all social routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/:id/follow",
                post(Self::handle_follow).delete(Self::handle_unfollow),
            )
            .route("/api/users/:id/followers", get(Self::handle_list_followers))
            .route("/api/users/:id/following", get(Self::handle_list_following))
            .route("/api/follows/requests", get(Self::handle_pending_requests))
            .route("/api/follows/:id/approve", post(Self::handle_approve))
            .route("/api/follows/:id/decline", post(Self::handle_decline))
            .route("/api/feed", get(Self::handle_feed))
            .with_state(resources)
    }

    async fn authenticate(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AuthResult> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(headers)
            .await
    }

    /// Load a follow edge addressed to the caller
    async fn load_incoming(resources: &ServerResources, auth: &AuthResult, follow_id: Uuid) -> AppResult<Follow> {
        let follow = resources
            .database
            .get_follow(follow_id)
            .await?
            .ok_or_else(|| AppError::not_found("Follow request"))?;
        if follow.followed_id != auth.user_id {
            return Err(AppError::permission_denied(
                "Only the requested user can answer a follow request",
            ));
        }
        Ok(follow)
    }

    /// Handle POST /api/users/:id/follow - Request to follow a user
    async fn handle_follow(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(target_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;

        if auth.user_id == target_id {
            return Err(AppError::invalid_input("Cannot follow yourself"));
        }
        resources
            .database
            .get_user(target_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::not_found("User"))?;
        if resources
            .database
            .get_follow_between(auth.user_id, target_id)
            .await?
            .is_some()
        {
            return Err(AppError::already_exists("Already following or requested"));
        }

        let follow = Follow::request(auth.user_id, target_id);
        resources.database.create_follow(&follow).await?;

        Notifier::new(&resources.database)
            .follow_request(target_id, follow.id, auth.user_id, &auth.display_name)
            .await;
        AppLogger::log_domain_event("follow_requested", &auth.user_id.to_string(), &target_id.to_string());

        Ok((StatusCode::CREATED, Json(follow)).into_response())
    }

    /// Handle DELETE /api/users/:id/follow - Unfollow or cancel a pending request
    async fn handle_unfollow(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(target_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;

        let follow = resources
            .database
            .get_follow_between(auth.user_id, target_id)
            .await?
            .ok_or_else(|| AppError::not_found("Follow"))?;
        resources.database.delete_follow(follow.id).await?;

        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/follows/:id/approve - Approve a pending request
    async fn handle_approve(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(follow_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let follow = Self::load_incoming(&resources, &auth, follow_id).await?;

        if follow.status != FollowStatus::Pending
            || !resources.database.approve_follow(follow.id, Utc::now()).await?
        {
            return Err(AppError::invalid_state("Follow request is not pending"));
        }

        Notifier::new(&resources.database)
            .follow_approved(follow.follower_id, auth.user_id, &auth.display_name)
            .await;
        AppLogger::log_domain_event("follow_approved", &auth.user_id.to_string(), &follow.follower_id.to_string());

        let approved = resources
            .database
            .get_follow(follow.id)
            .await?
            .ok_or_else(|| AppError::not_found("Follow request"))?;
        Ok((StatusCode::OK, Json(approved)).into_response())
    }

    /// Handle POST /api/follows/:id/decline - Decline a pending request
    async fn handle_decline(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(follow_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let follow = Self::load_incoming(&resources, &auth, follow_id).await?;

        if follow.status != FollowStatus::Pending {
            return Err(AppError::invalid_state("Follow request is not pending"));
        }
        resources.database.delete_follow(follow.id).await?;

        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/follows/requests - Incoming pending requests
    async fn handle_pending_requests(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;

        let requests: Vec<FollowRequestView> = resources
            .database
            .list_pending_requests(auth.user_id)
            .await?
            .into_iter()
            .map(|(follow, requester)| FollowRequestView { follow, requester })
            .collect();
        Ok((StatusCode::OK, Json(requests)).into_response())
    }

    /// Handle GET /api/users/:id/followers - Approved followers
    async fn handle_list_followers(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        Self::authenticate(&headers, &resources).await?;
        let users = resources.database.list_followers(user_id).await?;
        Ok((StatusCode::OK, Json(UserListResponse { total: users.len(), users })).into_response())
    }

    /// Handle GET /api/users/:id/following - Approved followees
    async fn handle_list_following(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        Self::authenticate(&headers, &resources).await?;
        let users = resources.database.list_following(user_id).await?;
        Ok((StatusCode::OK, Json(UserListResponse { total: users.len(), users })).into_response())
    }

    /// Handle GET /api/feed - Own and followed runners' runs, newest first
    async fn handle_feed(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<FeedQuery>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let params = PaginationParams::parse(query.cursor.as_deref(), query.limit)?;

        let items = resources.database.feed(auth.user_id, &params).await?;
        let page = CursorPage::from_overfetched(items, params.limit, |item: &FeedItem| {
            (item.run.run.started_at, item.seq.to_string())
        });
        Ok((StatusCode::OK, Json(page)).into_response())
    }
}
