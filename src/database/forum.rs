// ABOUTME: Forum database operations for posts, comments, and likes
// ABOUTME: Listings carry comment and like counts plus whether the viewer liked each post
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{cursor_position, fmt_ts, parse_enum, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ForumCategory, ForumComment, ForumPost, ForumPostSummary};
use crate::pagination::PaginationParams;

const SUMMARY_SELECT: &str = r"
    SELECT p.rowid AS seq, p.id, p.author_id, p.category, p.title, p.body, p.created_at, p.updated_at,
           u.display_name AS author_name,
           (SELECT COUNT(*) FROM forum_comments c WHERE c.post_id = p.id) AS comment_count,
           (SELECT COUNT(*) FROM forum_likes l WHERE l.post_id = p.id) AS like_count,
           EXISTS(SELECT 1 FROM forum_likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked_by_viewer
    FROM forum_posts p
    JOIN users u ON u.id = p.author_id
";

impl Database {
    pub(super) async fn migrate_forum(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS forum_posts (
                    id TEXT PRIMARY KEY,
                    author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    category TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS forum_comments (
                    id TEXT PRIMARY KEY,
                    post_id TEXT NOT NULL REFERENCES forum_posts(id) ON DELETE CASCADE,
                    author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    body TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS forum_likes (
                    id TEXT PRIMARY KEY,
                    post_id TEXT NOT NULL REFERENCES forum_posts(id) ON DELETE CASCADE,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    UNIQUE(post_id, user_id)
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_forum_posts_created ON forum_posts(created_at, id)",
                "CREATE INDEX IF NOT EXISTS idx_forum_comments_post ON forum_comments(post_id, created_at)",
            ],
            "forum",
        )
        .await
    }

    /// Insert a post
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_post(&self, post: &ForumPost) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO forum_posts (id, author_id, category, title, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(post.id.to_string())
        .bind(post.author_id.to_string())
        .bind(post.category.as_str())
        .bind(&post.title)
        .bind(&post.body)
        .bind(fmt_ts(post.created_at))
        .bind(fmt_ts(post.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create post: {e}")))?;

        Ok(post.id)
    }

    /// Get a post by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_post(&self, post_id: Uuid) -> AppResult<Option<ForumPost>> {
        let row = sqlx::query(
            "SELECT id, author_id, category, title, body, created_at, updated_at FROM forum_posts WHERE id = $1",
        )
        .bind(post_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get post: {e}")))?;

        row.map(|r| Self::row_to_post(&r)).transpose()
    }

    /// Persist an edited post
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_post(&self, post: &ForumPost) -> AppResult<()> {
        sqlx::query("UPDATE forum_posts SET category = $1, title = $2, body = $3, updated_at = $4 WHERE id = $5")
            .bind(post.category.as_str())
            .bind(&post.title)
            .bind(&post.body)
            .bind(fmt_ts(post.updated_at))
            .bind(post.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update post: {e}")))?;
        Ok(())
    }

    /// Delete a post with its comments and likes
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_post(&self, post_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM forum_posts WHERE id = $1")
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete post: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest posts first with counts, continuing after the cursor position
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_posts(
        &self,
        viewer_id: Uuid,
        category: Option<ForumCategory>,
        params: &PaginationParams,
    ) -> AppResult<Vec<ForumPostSummary>> {
        let (after_ts, after_seq) = cursor_position(params)?;

        let rows = sqlx::query(&format!(
            r"
            {SUMMARY_SELECT}
            WHERE ($2 IS NULL OR p.category = $2)
              AND ($3 IS NULL OR p.created_at < $3 OR (p.created_at = $3 AND p.rowid < $4))
            ORDER BY p.created_at DESC, p.rowid DESC
            LIMIT $5
            "
        ))
        .bind(viewer_id.to_string())
        .bind(category.map(|c| c.as_str()))
        .bind(after_ts)
        .bind(after_seq)
        .bind(params.fetch_limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list posts: {e}")))?;

        rows.iter().map(Self::row_to_summary).collect()
    }

    /// One post with counts as seen by the viewer
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_post_summary(&self, post_id: Uuid, viewer_id: Uuid) -> AppResult<Option<ForumPostSummary>> {
        let row = sqlx::query(&format!("{SUMMARY_SELECT} WHERE p.id = $2"))
            .bind(viewer_id.to_string())
            .bind(post_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get post: {e}")))?;

        row.map(|r| Self::row_to_summary(&r)).transpose()
    }

    /// Insert a comment
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_comment(&self, comment: &ForumComment) -> AppResult<Uuid> {
        sqlx::query(
            "INSERT INTO forum_comments (id, post_id, author_id, body, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id.to_string())
        .bind(comment.post_id.to_string())
        .bind(comment.author_id.to_string())
        .bind(&comment.body)
        .bind(fmt_ts(comment.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create comment: {e}")))?;

        Ok(comment.id)
    }

    /// Comments on a post, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_comments(&self, post_id: Uuid) -> AppResult<Vec<ForumComment>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.post_id, c.author_id, u.display_name AS author_name, c.body, c.created_at
            FROM forum_comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.rowid ASC
            ",
        )
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list comments: {e}")))?;

        rows.iter().map(Self::row_to_comment).collect()
    }

    /// Get a comment by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_comment(&self, comment_id: Uuid) -> AppResult<Option<ForumComment>> {
        let row = sqlx::query(
            r"
            SELECT c.id, c.post_id, c.author_id, u.display_name AS author_name, c.body, c.created_at
            FROM forum_comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.id = $1
            ",
        )
        .bind(comment_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get comment: {e}")))?;

        row.map(|r| Self::row_to_comment(&r)).transpose()
    }

    /// Delete a comment
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM forum_comments WHERE id = $1")
            .bind(comment_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete comment: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Like the post if the user has not, otherwise remove the like
    ///
    /// Returns whether the post is liked afterwards and the new like count.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<(bool, i64)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let removed = sqlx::query("DELETE FROM forum_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to remove like: {e}")))?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO forum_likes (id, post_id, user_id, created_at) VALUES ($1, $2, $3, $4)")
                .bind(Uuid::new_v4().to_string())
                .bind(post_id.to_string())
                .bind(user_id.to_string())
                .bind(fmt_ts(Utc::now()))
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to add like: {e}")))?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM forum_likes WHERE post_id = $1")
            .bind(post_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to count likes: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit like: {e}")))?;

        Ok((!removed, count))
    }

    fn row_to_post(row: &SqliteRow) -> AppResult<ForumPost> {
        Ok(ForumPost {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            author_id: parse_uuid(&row.get::<String, _>("author_id"))?,
            category: parse_enum(&row.get::<String, _>("category"))?,
            title: row.get("title"),
            body: row.get("body"),
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
            updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
        })
    }

    fn row_to_summary(row: &SqliteRow) -> AppResult<ForumPostSummary> {
        Ok(ForumPostSummary {
            seq: row.get("seq"),
            post: Self::row_to_post(row)?,
            author_name: row.get("author_name"),
            comment_count: row.get("comment_count"),
            like_count: row.get("like_count"),
            liked_by_viewer: row.get("liked_by_viewer"),
        })
    }

    fn row_to_comment(row: &SqliteRow) -> AppResult<ForumComment> {
        Ok(ForumComment {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            post_id: parse_uuid(&row.get::<String, _>("post_id"))?,
            author_id: parse_uuid(&row.get::<String, _>("author_id"))?,
            author_name: row.get("author_name"),
            body: row.get("body"),
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        })
    }
}
