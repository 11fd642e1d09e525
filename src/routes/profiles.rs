// ABOUTME: Profile route handlers for the caller's profile, avatar uploads, and public profiles
// ABOUTME: Avatars are validated as images, stored under avatars/, and replace the previous file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{multipart_error, read_image};
use crate::constants::profiles::{MAX_BIO_LENGTH, MAX_LOCATION_LENGTH, MAX_WEEKLY_GOAL_KM};
use crate::errors::{AppError, AppResult, FieldErrors};
use crate::extract::{Json, Path};
use crate::models::{ExperienceLevel, Profile, User, UserRole};
use crate::resources::ServerResources;
use crate::storage::public_url;

/// Storage category for avatars
const AVATAR_CATEGORY: &str = "avatars";

/// Profile update request; omitted fields are cleared
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// Free-form bio
    #[serde(default)]
    pub bio: Option<String>,
    /// Home location
    #[serde(default)]
    pub location: Option<String>,
    /// Self-reported experience level
    #[serde(default)]
    pub experience_level: Option<String>,
    /// Weekly distance goal in kilometers
    #[serde(default)]
    pub weekly_goal_km: Option<f64>,
}

impl UpdateProfileRequest {
    fn into_profile(self, user_id: Uuid) -> AppResult<Profile> {
        let mut errors = FieldErrors::new();

        let bio = self.bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
        let location = self.location.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty());
        errors.require(
            bio.as_ref().is_none_or(|b| b.chars().count() <= MAX_BIO_LENGTH),
            "bio",
            format!("Must be at most {MAX_BIO_LENGTH} characters"),
        );
        errors.require(
            location.as_ref().is_none_or(|l| l.chars().count() <= MAX_LOCATION_LENGTH),
            "location",
            format!("Must be at most {MAX_LOCATION_LENGTH} characters"),
        );

        let experience_level = match self.experience_level.as_deref() {
            None | Some("") => None,
            Some(raw) => {
                let parsed = raw.parse::<ExperienceLevel>().ok();
                if parsed.is_none() {
                    errors.add(
                        "experience_level",
                        "Must be one of beginner, intermediate, advanced, elite",
                    );
                }
                parsed
            }
        };

        errors.require(
            self.weekly_goal_km
                .is_none_or(|km| km.is_finite() && (0.0..=MAX_WEEKLY_GOAL_KM).contains(&km)),
            "weekly_goal_km",
            format!("Must be between 0 and {MAX_WEEKLY_GOAL_KM}"),
        );

        errors.into_result()?;
        Ok(Profile {
            user_id,
            bio,
            location,
            experience_level,
            weekly_goal_km: self.weekly_goal_km,
            avatar_path: None,
            updated_at: Utc::now(),
        })
    }
}

/// Profile with its public avatar URL
#[derive(Debug, Serialize)]
pub struct ProfileView {
    /// Stored profile
    #[serde(flatten)]
    pub profile: Profile,
    /// URL the avatar is served at
    pub avatar_url: Option<String>,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        let avatar_url = profile.avatar_path.as_deref().map(public_url);
        Self { profile, avatar_url }
    }
}

/// Profile another user sees
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    /// User `ID`
    pub id: Uuid,
    /// Display name
    pub display_name: String,
    /// Stored role
    pub role: UserRole,
    /// Profile fields
    pub profile: ProfileView,
    /// Approved followers
    pub follower_count: i64,
    /// Approved followees
    pub following_count: i64,
    /// Lifetime run distance
    pub total_distance_km: f64,
    /// Lifetime number of runs
    pub total_runs: i64,
}

/// Own profile response
#[derive(Debug, Serialize)]
struct OwnProfileResponse {
    user: User,
    profile: ProfileView,
}

/// Profile routes
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/profile",
                get(Self::handle_get_profile).put(Self::handle_update_profile),
            )
            .route("/api/profile/avatar", post(Self::handle_upload_avatar))
            .route("/api/users/:id/profile", get(Self::handle_public_profile))
            .with_state(resources)
    }

    async fn load_profile(resources: &ServerResources, user_id: Uuid) -> AppResult<Profile> {
        Ok(resources
            .database
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id)))
    }

    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let user = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let profile = Self::load_profile(&resources, auth.user_id).await?;

        Ok((
            StatusCode::OK,
            Json(OwnProfileResponse {
                user,
                profile: profile.into(),
            }),
        )
            .into_response())
    }

    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let profile = request.into_profile(auth.user_id)?;
        resources.database.update_profile(&profile).await?;

        let profile = Self::load_profile(&resources, auth.user_id).await?;
        Ok((StatusCode::OK, Json(ProfileView::from(profile))).into_response())
    }

    async fn handle_upload_avatar(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        let max_bytes = resources.config.uploads.max_bytes;

        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e, max_bytes))?
        {
            if field.name() == Some("avatar") {
                upload = Some(read_image(field, max_bytes).await?);
            }
        }
        let upload = upload.ok_or_else(|| AppError::invalid_input("Missing multipart field 'avatar'"))?;

        let path = resources
            .storage
            .store(AVATAR_CATEGORY, upload.extension, &upload.bytes)
            .await?;
        let previous = resources.database.set_avatar_path(auth.user_id, &path).await?;

        if let Some(previous) = previous.filter(|p| *p != path) {
            if let Err(e) = resources.storage.delete(&previous).await {
                warn!(user_id = %auth.user_id, path = %previous, error = %e, "Failed to remove previous avatar");
            }
        }

        info!(user_id = %auth.user_id, path = %path, "Avatar updated");
        let profile = Self::load_profile(&resources, auth.user_id).await?;
        Ok((StatusCode::OK, Json(ProfileView::from(profile))).into_response())
    }

    async fn handle_public_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let user = resources
            .database
            .get_user(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::not_found("User"))?;
        let profile = Self::load_profile(&resources, user_id).await?;
        let (follower_count, following_count) = resources.database.follow_counts(user_id).await?;
        let (total_distance_km, total_runs) = resources.database.lifetime_totals(user_id).await?;

        Ok((
            StatusCode::OK,
            Json(PublicProfile {
                id: user.id,
                display_name: user.display_name,
                role: user.role,
                profile: profile.into(),
                follower_count,
                following_count,
                total_distance_km,
                total_runs,
            }),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_profile_update_validates_every_field() {
        let request = UpdateProfileRequest {
            bio: Some("x".repeat(MAX_BIO_LENGTH + 1)),
            location: Some("Lyon".into()),
            experience_level: Some("legendary".into()),
            weekly_goal_km: Some(900.0),
        };
        let err = request.into_profile(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let fields = &err.details.unwrap()["fields"];
        assert!(fields.get("bio").is_some());
        assert!(fields.get("experience_level").is_some());
        assert!(fields.get("weekly_goal_km").is_some());
        assert!(fields.get("location").is_none());
    }

    #[test]
    fn test_blank_fields_are_cleared() {
        let request = UpdateProfileRequest {
            bio: Some("   ".into()),
            experience_level: Some("advanced".into()),
            ..UpdateProfileRequest::default()
        };
        let profile = request.into_profile(Uuid::new_v4()).unwrap();
        assert!(profile.bio.is_none());
        assert_eq!(profile.experience_level, Some(ExperienceLevel::Advanced));
    }
}
