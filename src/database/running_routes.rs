// ABOUTME: Running route catalog database operations: routes, ratings, and photos
// ABOUTME: Ratings are one per user per route; a repeat rating replaces the first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_enum, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{RouteDifficulty, RoutePhoto, RouteRating, RouteWithRating, RunningRoute, Surface};
use crate::storage::public_url;

/// Optional filters for listing routes
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteFilter {
    /// Only routes of this difficulty
    pub difficulty: Option<RouteDifficulty>,
    /// Only routes on this surface
    pub surface: Option<Surface>,
}

const ROUTE_WITH_RATING_SELECT: &str = r"
    SELECT r.id, r.creator_id, r.name, r.description, r.location, r.distance_km,
           r.elevation_gain_m, r.difficulty, r.surface, r.created_at,
           AVG(rr.rating) AS average_rating, COUNT(rr.id) AS rating_count
    FROM routes r
    LEFT JOIN route_ratings rr ON rr.route_id = r.id
";

impl Database {
    pub(super) async fn migrate_running_routes(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS routes (
                    id TEXT PRIMARY KEY,
                    creator_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    description TEXT,
                    location TEXT,
                    distance_km REAL NOT NULL,
                    elevation_gain_m REAL NOT NULL DEFAULT 0,
                    difficulty TEXT NOT NULL,
                    surface TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS route_ratings (
                    id TEXT PRIMARY KEY,
                    route_id TEXT NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    review TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(route_id, user_id)
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS route_photos (
                    id TEXT PRIMARY KEY,
                    route_id TEXT NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    file_path TEXT NOT NULL,
                    caption TEXT,
                    created_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_route_photos_route ON route_photos(route_id)",
            ],
            "running routes",
        )
        .await
    }

    /// Insert a route
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_route(&self, route: &RunningRoute) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO routes (id, creator_id, name, description, location, distance_km,
                                elevation_gain_m, difficulty, surface, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(route.id.to_string())
        .bind(route.creator_id.to_string())
        .bind(&route.name)
        .bind(&route.description)
        .bind(&route.location)
        .bind(route.distance_km)
        .bind(route.elevation_gain_m)
        .bind(route.difficulty.as_str())
        .bind(route.surface.as_str())
        .bind(fmt_ts(route.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create route: {e}")))?;

        Ok(route.id)
    }

    /// Whether a route exists
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn route_exists(&self, route_id: Uuid) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM routes WHERE id = $1")
            .bind(route_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up route: {e}")))?;
        Ok(found.is_some())
    }

    /// A route with its rating aggregate
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_route_with_rating(&self, route_id: Uuid) -> AppResult<Option<RouteWithRating>> {
        let row = sqlx::query(&format!(
            "{ROUTE_WITH_RATING_SELECT} WHERE r.id = $1 GROUP BY r.id"
        ))
        .bind(route_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get route: {e}")))?;

        row.map(|r| Self::row_to_route_with_rating(&r)).transpose()
    }

    /// Routes ordered by average rating (unrated last), then name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_routes(&self, filter: RouteFilter) -> AppResult<Vec<RouteWithRating>> {
        let rows = sqlx::query(&format!(
            r"
            {ROUTE_WITH_RATING_SELECT}
            WHERE ($1 IS NULL OR r.difficulty = $1) AND ($2 IS NULL OR r.surface = $2)
            GROUP BY r.id
            ORDER BY COALESCE(AVG(rr.rating), 0) DESC, r.name ASC
            "
        ))
        .bind(filter.difficulty.map(|d| d.as_str()))
        .bind(filter.surface.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list routes: {e}")))?;

        rows.iter().map(Self::row_to_route_with_rating).collect()
    }

    /// Insert or replace the caller's rating of a route
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_rating(&self, rating: &RouteRating) -> AppResult<RouteRating> {
        sqlx::query(
            r"
            INSERT INTO route_ratings (id, route_id, user_id, rating, review, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(route_id, user_id) DO UPDATE SET
                rating = excluded.rating,
                review = excluded.review,
                updated_at = excluded.updated_at
            ",
        )
        .bind(rating.id.to_string())
        .bind(rating.route_id.to_string())
        .bind(rating.user_id.to_string())
        .bind(rating.rating)
        .bind(&rating.review)
        .bind(fmt_ts(rating.created_at))
        .bind(fmt_ts(rating.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save rating: {e}")))?;

        let row = sqlx::query(
            r"
            SELECT id, route_id, user_id, rating, review, created_at, updated_at
            FROM route_ratings WHERE route_id = $1 AND user_id = $2
            ",
        )
        .bind(rating.route_id.to_string())
        .bind(rating.user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read rating: {e}")))?;

        Ok(RouteRating {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            route_id: parse_uuid(&row.get::<String, _>("route_id"))?,
            user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
            rating: row.get("rating"),
            review: row.get("review"),
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
            updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
        })
    }

    /// Record an uploaded route photo
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn add_route_photo(&self, photo: &RoutePhoto) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO route_photos (id, route_id, user_id, file_path, caption, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(photo.id.to_string())
        .bind(photo.route_id.to_string())
        .bind(photo.user_id.to_string())
        .bind(&photo.file_path)
        .bind(&photo.caption)
        .bind(fmt_ts(photo.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save route photo: {e}")))?;

        Ok(photo.id)
    }

    /// Photos of a route, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_route_photos(&self, route_id: Uuid) -> AppResult<Vec<RoutePhoto>> {
        let rows = sqlx::query(
            r"
            SELECT id, route_id, user_id, file_path, caption, created_at
            FROM route_photos WHERE route_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(route_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list route photos: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<RoutePhoto> {
                let file_path: String = r.get("file_path");
                Ok(RoutePhoto {
                    id: parse_uuid(&r.get::<String, _>("id"))?,
                    route_id: parse_uuid(&r.get::<String, _>("route_id"))?,
                    user_id: parse_uuid(&r.get::<String, _>("user_id"))?,
                    url: public_url(&file_path),
                    file_path,
                    caption: r.get("caption"),
                    created_at: parse_ts(&r.get::<String, _>("created_at"))?,
                })
            })
            .collect()
    }

    fn row_to_route_with_rating(row: &SqliteRow) -> AppResult<RouteWithRating> {
        Ok(RouteWithRating {
            route: RunningRoute {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                creator_id: parse_uuid(&row.get::<String, _>("creator_id"))?,
                name: row.get("name"),
                description: row.get("description"),
                location: row.get("location"),
                distance_km: row.get("distance_km"),
                elevation_gain_m: row.get("elevation_gain_m"),
                difficulty: parse_enum(&row.get::<String, _>("difficulty"))?,
                surface: parse_enum(&row.get::<String, _>("surface"))?,
                created_at: parse_ts(&row.get::<String, _>("created_at"))?,
            },
            average_rating: row
                .get::<Option<f64>, _>("average_rating")
                .map(|avg| (avg * 100.0).round() / 100.0),
            rating_count: row.get("rating_count"),
        })
    }
}
