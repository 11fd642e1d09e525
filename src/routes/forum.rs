// ABOUTME: Forum route handlers for posts, comments, and likes
// ABOUTME: Authors or admins edit and delete; comments and first likes notify the post author
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
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthResult,
    constants::forum::{MAX_BODY_LENGTH, MAX_COMMENT_LENGTH, MAX_TITLE_LENGTH, MIN_TITLE_LENGTH},
    errors::{AppError, AppResult, FieldErrors},
    extract::{Json, Path, Query},
    models::{ForumCategory, ForumComment, ForumPost, ForumPostSummary},
    pagination::{CursorPage, PaginationParams},
    resources::ServerResources,
    services::notifications::Notifier,
};

/// Post create or edit request
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    /// Category
    pub category: ForumCategory,
    /// Title
    pub title: String,
    /// Markdown body
    pub body: String,
}

impl PostRequest {
    fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        let title_len = self.title.trim().chars().count();
        errors.require(
            (MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&title_len),
            "title",
            format!("Must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters"),
        );
        let body_len = self.body.trim().chars().count();
        errors.require(
            (1..=MAX_BODY_LENGTH).contains(&body_len),
            "body",
            format!("Must be between 1 and {MAX_BODY_LENGTH} characters"),
        );
        errors.into_result()
    }
}

/// Comment request
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Comment text
    pub body: String,
}

/// Post listing query
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    /// Category filter
    pub category: Option<ForumCategory>,
    /// Opaque cursor from the previous page
    pub cursor: Option<String>,
    /// Page size
    pub limit: Option<i64>,
}

/// Post with its comments
#[derive(Debug, Serialize)]
pub struct PostDetail {
    /// Post with counts
    pub post: ForumPostSummary,
    /// Comments, oldest first
    pub comments: Vec<ForumComment>,
}

/// Like toggle result
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    /// Whether the caller now likes the post
    pub liked: bool,
    /// Likes after the toggle
    pub like_count: i64,
}

/// Forum routes
pub struct ForumRoutes;

impl ForumRoutes {
    /// Create all forum routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/forum/posts",
                get(Self::handle_list_posts).post(Self::handle_create_post),
            )
            .route(
                "/api/forum/posts/:id",
                get(Self::handle_get_post)
                    .put(Self::handle_update_post)
                    .delete(Self::handle_delete_post),
            )
            .route("/api/forum/posts/:id/comments", post(Self::handle_add_comment))
            .route("/api/forum/posts/:id/like", post(Self::handle_toggle_like))
            .route("/api/forum/comments/:id", delete(Self::handle_delete_comment))
            .with_state(resources)
    }

    async fn authenticate(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AuthResult> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(headers)
            .await
    }

    async fn load_post(resources: &ServerResources, post_id: Uuid) -> AppResult<ForumPost> {
        resources
            .database
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Forum post"))
    }

    async fn load_summary(resources: &ServerResources, post_id: Uuid, viewer_id: Uuid) -> AppResult<ForumPostSummary> {
        resources
            .database
            .get_post_summary(post_id, viewer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Forum post"))
    }

    /// Handle GET /api/forum/posts - Newest posts first, cursor paginated
    async fn handle_list_posts(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<PostListQuery>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let params = PaginationParams::parse(query.cursor.as_deref(), query.limit)?;

        let posts = resources
            .database
            .list_posts(auth.user_id, query.category, &params)
            .await?;
        let page = CursorPage::from_overfetched(posts, params.limit, |s: &ForumPostSummary| {
            (s.post.created_at, s.seq.to_string())
        });
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle POST /api/forum/posts - Create a post
    async fn handle_create_post(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<PostRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        request.validate()?;

        let now = Utc::now();
        let post = ForumPost {
            id: Uuid::new_v4(),
            author_id: auth.user_id,
            category: request.category,
            title: request.title.trim().to_owned(),
            body: request.body.trim().to_owned(),
            created_at: now,
            updated_at: now,
        };
        resources.database.create_post(&post).await?;

        let summary = Self::load_summary(&resources, post.id, auth.user_id).await?;
        Ok((StatusCode::CREATED, Json(summary)).into_response())
    }

    /// Handle GET /api/forum/posts/:id - Post with comments
    async fn handle_get_post(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(post_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;

        let post = Self::load_summary(&resources, post_id, auth.user_id).await?;
        let comments = resources.database.list_comments(post_id).await?;
        Ok((StatusCode::OK, Json(PostDetail { post, comments })).into_response())
    }

    /// Handle PUT /api/forum/posts/:id - Edit a post
    async fn handle_update_post(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(post_id): Path<Uuid>,
        Json(request): Json<PostRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let mut post = Self::load_post(&resources, post_id).await?;
        auth.require_owner_or_admin(post.author_id, "edit this post")?;
        request.validate()?;

        post.category = request.category;
        post.title = request.title.trim().to_owned();
        post.body = request.body.trim().to_owned();
        post.updated_at = Utc::now();
        resources.database.update_post(&post).await?;

        let summary = Self::load_summary(&resources, post.id, auth.user_id).await?;
        Ok((StatusCode::OK, Json(summary)).into_response())
    }

    /// Handle DELETE /api/forum/posts/:id - Delete a post with its comments and likes
    async fn handle_delete_post(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(post_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let post = Self::load_post(&resources, post_id).await?;
        auth.require_owner_or_admin(post.author_id, "delete this post")?;

        resources.database.delete_post(post.id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/forum/posts/:id/comments - Comment on a post
    async fn handle_add_comment(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(post_id): Path<Uuid>,
        Json(request): Json<CommentRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let post = Self::load_post(&resources, post_id).await?;

        let body = request.body.trim().to_owned();
        let mut errors = FieldErrors::new();
        errors.require(
            (1..=MAX_COMMENT_LENGTH).contains(&body.chars().count()),
            "body",
            format!("Must be between 1 and {MAX_COMMENT_LENGTH} characters"),
        );
        errors.into_result()?;

        let comment = ForumComment {
            id: Uuid::new_v4(),
            post_id,
            author_id: auth.user_id,
            author_name: auth.display_name.clone(),
            body,
            created_at: Utc::now(),
        };
        resources.database.create_comment(&comment).await?;

        if post.author_id != auth.user_id {
            Notifier::new(&resources.database)
                .forum_comment(&post, &auth.display_name, comment.id)
                .await;
        }
        Ok((StatusCode::CREATED, Json(comment)).into_response())
    }

    /// Handle DELETE /api/forum/comments/:id - Delete a comment
    async fn handle_delete_comment(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(comment_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let comment = resources
            .database
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;
        auth.require_owner_or_admin(comment.author_id, "delete this comment")?;

        resources.database.delete_comment(comment.id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/forum/posts/:id/like - Toggle the caller's like
    async fn handle_toggle_like(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(post_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources).await?;
        let post = Self::load_post(&resources, post_id).await?;

        let (liked, like_count) = resources.database.toggle_like(post.id, auth.user_id).await?;
        if liked && post.author_id != auth.user_id {
            Notifier::new(&resources.database)
                .forum_like(&post, auth.user_id, &auth.display_name)
                .await;
        }
        Ok((StatusCode::OK, Json(LikeResponse { liked, like_count })).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_title_bounds() {
        let short = PostRequest {
            category: ForumCategory::General,
            title: "Hi".into(),
            body: "Body".into(),
        };
        assert!(short.validate().is_err());

        let ok = PostRequest {
            category: ForumCategory::Gear,
            title: "Shoe rotation".into(),
            body: "How many pairs do you rotate?".into(),
        };
        assert!(ok.validate().is_ok());
    }
}
