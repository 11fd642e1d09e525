// ABOUTME: Running route handlers: catalog, ratings, photo uploads, and leaderboards
// ABOUTME: Leaderboards keep each runner's fastest run on the route, ranked by duration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Running route routes
//!
//! Named `running_routes` to keep the domain noun apart from axum routing.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{field_text, multipart_error, read_image, ImageUpload};
use crate::constants::routes::{
    MAX_CAPTION_LENGTH, MAX_LEADERBOARD_SIZE, MAX_NAME_LENGTH, MAX_RATING, MAX_REVIEW_LENGTH,
    MIN_RATING,
};
use crate::constants::runs::{MAX_DISTANCE_KM, MAX_ELEVATION_GAIN_M};
use crate::database::RouteFilter;
use crate::errors::{AppError, AppResult, FieldErrors};
use crate::extract::{Json, Path, Query};
use crate::models::{
    rank_leaderboard, LeaderboardEntry, RouteDifficulty, RouteRating, RoutePhoto, RunningRoute,
    Surface,
};
use crate::resources::ServerResources;
use crate::storage::public_url;

/// Storage category for route photos
const PHOTO_CATEGORY: &str = "route_photos";

/// Route creation request
#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    /// Route name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Where the route starts
    #[serde(default)]
    pub location: Option<String>,
    /// Length in kilometers
    pub distance_km: f64,
    /// Total climb in meters
    #[serde(default)]
    pub elevation_gain_m: f64,
    /// Difficulty
    pub difficulty: RouteDifficulty,
    /// Dominant surface
    pub surface: Surface,
}

impl CreateRouteRequest {
    fn into_route(self, creator_id: Uuid) -> AppResult<RunningRoute> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim().to_owned();
        errors.require(
            (1..=MAX_NAME_LENGTH).contains(&name.chars().count()),
            "name",
            format!("Must be between 1 and {MAX_NAME_LENGTH} characters"),
        );
        errors.require(
            self.distance_km.is_finite() && self.distance_km > 0.0 && self.distance_km <= MAX_DISTANCE_KM,
            "distance_km",
            format!("Must be greater than 0 and at most {MAX_DISTANCE_KM}"),
        );
        errors.require(
            self.elevation_gain_m.is_finite() && (0.0..=MAX_ELEVATION_GAIN_M).contains(&self.elevation_gain_m),
            "elevation_gain_m",
            format!("Must be between 0 and {MAX_ELEVATION_GAIN_M}"),
        );
        errors.into_result()?;

        Ok(RunningRoute {
            id: Uuid::new_v4(),
            creator_id,
            name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            location: self.location.filter(|l| !l.trim().is_empty()),
            distance_km: self.distance_km,
            elevation_gain_m: self.elevation_gain_m,
            difficulty: self.difficulty,
            surface: self.surface,
            created_at: Utc::now(),
        })
    }
}

/// Route listing filters
#[derive(Debug, Deserialize)]
pub struct RouteListQuery {
    /// Difficulty filter
    pub difficulty: Option<RouteDifficulty>,
    /// Surface filter
    pub surface: Option<Surface>,
}

/// Star rating request
#[derive(Debug, Deserialize)]
pub struct RateRouteRequest {
    /// 1 to 5 stars
    pub rating: i64,
    /// Optional review text
    #[serde(default)]
    pub review: Option<String>,
}

/// Leaderboard query
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Number of entries, configured default when omitted
    pub limit: Option<usize>,
}

/// Leaderboard response
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    /// Route the leaderboard belongs to
    pub route_id: Uuid,
    /// Ranked entries, fastest first
    pub entries: Vec<LeaderboardEntry>,
}

/// Running route routes
pub struct RunningRouteRoutes;

impl RunningRouteRoutes {
    /// Create all running route routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/routes",
                get(Self::handle_list_routes).post(Self::handle_create_route),
            )
            .route("/api/routes/:id", get(Self::handle_get_route))
            .route("/api/routes/:id/ratings", post(Self::handle_rate_route))
            .route(
                "/api/routes/:id/photos",
                get(Self::handle_list_photos).post(Self::handle_upload_photo),
            )
            .route("/api/routes/:id/leaderboard", get(Self::handle_leaderboard))
            .with_state(resources)
    }

    async fn ensure_route(resources: &ServerResources, route_id: Uuid) -> AppResult<()> {
        if resources.database.route_exists(route_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Route"))
        }
    }

    async fn handle_create_route(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateRouteRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let route = request.into_route(auth.user_id)?;
        resources.database.create_route(&route).await?;
        info!(user_id = %auth.user_id, route_id = %route.id, "Route created");

        let created = resources
            .database
            .get_route_with_rating(route.id)
            .await?
            .ok_or_else(|| AppError::not_found("Route"))?;
        Ok((StatusCode::CREATED, Json(created)).into_response())
    }

    async fn handle_list_routes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RouteListQuery>,
    ) -> Result<Response, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let routes = resources
            .database
            .list_routes(RouteFilter {
                difficulty: query.difficulty,
                surface: query.surface,
            })
            .await?;
        Ok((StatusCode::OK, Json(routes)).into_response())
    }

    async fn handle_get_route(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(route_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let route = resources
            .database
            .get_route_with_rating(route_id)
            .await?
            .ok_or_else(|| AppError::not_found("Route"))?;
        Ok((StatusCode::OK, Json(route)).into_response())
    }

    async fn handle_rate_route(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(route_id): Path<Uuid>,
        Json(request): Json<RateRouteRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        Self::ensure_route(&resources, route_id).await?;

        let review = request.review.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        let mut errors = FieldErrors::new();
        errors.require(
            (MIN_RATING..=MAX_RATING).contains(&request.rating),
            "rating",
            format!("Must be between {MIN_RATING} and {MAX_RATING}"),
        );
        errors.require(
            review.as_ref().is_none_or(|r| r.chars().count() <= MAX_REVIEW_LENGTH),
            "review",
            format!("Must be at most {MAX_REVIEW_LENGTH} characters"),
        );
        errors.into_result()?;

        let now = Utc::now();
        let rating = resources
            .database
            .upsert_rating(&RouteRating {
                id: Uuid::new_v4(),
                route_id,
                user_id: auth.user_id,
                rating: request.rating,
                review,
                created_at: now,
                updated_at: now,
            })
            .await?;
        Ok((StatusCode::OK, Json(rating)).into_response())
    }

    async fn handle_list_photos(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(route_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        Self::ensure_route(&resources, route_id).await?;

        let photos = resources.database.list_route_photos(route_id).await?;
        Ok((StatusCode::OK, Json(photos)).into_response())
    }

    async fn handle_upload_photo(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(route_id): Path<Uuid>,
        mut multipart: Multipart,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        Self::ensure_route(&resources, route_id).await?;
        let max_bytes = resources.config.uploads.max_bytes;

        let mut upload: Option<ImageUpload> = None;
        let mut caption = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e, max_bytes))?
        {
            match field.name() {
                Some("photo") => upload = Some(read_image(field, max_bytes).await?),
                Some("caption") => caption = Some(field_text(field, max_bytes).await?),
                _ => {}
            }
        }
        let upload = upload.ok_or_else(|| AppError::invalid_input("Missing multipart field 'photo'"))?;
        let caption = caption.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty());
        if caption
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_CAPTION_LENGTH)
        {
            let mut errors = FieldErrors::new();
            errors.add("caption", format!("Must be at most {MAX_CAPTION_LENGTH} characters"));
            errors.into_result()?;
        }

        let file_path = resources
            .storage
            .store(PHOTO_CATEGORY, upload.extension, &upload.bytes)
            .await?;
        let photo = RoutePhoto {
            id: Uuid::new_v4(),
            route_id,
            user_id: auth.user_id,
            url: public_url(&file_path),
            file_path,
            caption,
            created_at: Utc::now(),
        };
        resources.database.add_route_photo(&photo).await?;

        info!(user_id = %auth.user_id, route_id = %route_id, photo_id = %photo.id, "Route photo uploaded");
        Ok((StatusCode::CREATED, Json(photo)).into_response())
    }

    async fn handle_leaderboard(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(route_id): Path<Uuid>,
        Query(query): Query<LeaderboardQuery>,
    ) -> Result<Response, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        Self::ensure_route(&resources, route_id).await?;

        let limit = query
            .limit
            .unwrap_or(resources.config.leaderboard_size)
            .clamp(1, MAX_LEADERBOARD_SIZE);
        let candidates = resources.database.leaderboard_candidates(route_id).await?;

        Ok((
            StatusCode::OK,
            Json(LeaderboardResponse {
                route_id,
                entries: rank_leaderboard(candidates, limit),
            }),
        )
            .into_response())
    }
}
