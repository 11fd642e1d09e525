// ABOUTME: Authentication route handlers for registration, login, logout, and the current user
// ABOUTME: Issues the HttpOnly session cookie alongside the token in the JSON body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Login and registration both answer with the session token in the body
//! and in the `auth_token` cookie, so API clients and browsers share one
//! flow. Every login failure answers with the same 401.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::constants::auth::{
    MAX_DISPLAY_NAME_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, SESSION_COOKIE,
};
use crate::errors::{AppError, AppResult, FieldErrors};
use crate::extract::Json;
use crate::logging::AppLogger;
use crate::models::{is_valid_email, User, UserRole};
use crate::resources::ServerResources;
use crate::security::cookies::{clear_cookie, session_cookie};

/// Generic message for every failed login
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// User registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Public display name
    pub display_name: String,
    /// Requested role, `runner` when omitted
    #[serde(default)]
    pub role: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Successful registration or login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session JWT
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    /// The authenticated user
    pub user: User,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/logout", post(Self::handle_logout))
            .route("/api/auth/me", get(Self::handle_me))
            .with_state(resources)
    }

    /// Validate a registration request and resolve the requested role
    fn validate_registration(request: &RegisterRequest) -> AppResult<UserRole> {
        let mut errors = FieldErrors::new();

        errors.require(
            is_valid_email(&request.email),
            "email",
            "Must be a valid email address",
        );
        errors.require(
            request.password.len() >= MIN_PASSWORD_LENGTH,
            "password",
            format!("Must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
        errors.require(
            request.password.len() <= MAX_PASSWORD_LENGTH,
            "password",
            format!("Must be at most {MAX_PASSWORD_LENGTH} bytes"),
        );
        let name_len = request.display_name.trim().chars().count();
        errors.require(
            (1..=MAX_DISPLAY_NAME_LENGTH).contains(&name_len),
            "display_name",
            format!("Must be between 1 and {MAX_DISPLAY_NAME_LENGTH} characters"),
        );

        let role = match request.role.as_deref() {
            None => Some(UserRole::Runner),
            Some(raw) => raw.parse::<UserRole>().ok().filter(UserRole::is_self_assignable),
        };
        if role.is_none() {
            errors.add("role", "Must be either runner or trainer");
        }

        errors.into_result()?;
        role.ok_or_else(|| AppError::invalid_input("Invalid role"))
    }

    /// Token plus cookie response shared by register and login
    fn session_response(
        resources: &ServerResources,
        status: StatusCode,
        user: User,
    ) -> Result<Response, AppError> {
        let token = resources.auth_manager.generate_token(&user)?;
        let expires_in = resources.auth_manager.token_lifetime_seconds();
        let cookie = session_cookie(
            SESSION_COOKIE,
            &token,
            expires_in,
            resources.config.environment.is_production(),
        )?;

        let body = SessionResponse {
            token,
            expires_in,
            user,
        };
        Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
    }

    /// Handle user registration
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let role = Self::validate_registration(&request)?;

        let password = request.password;
        let cost = resources.config.auth.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))??;

        let user = User::new(
            &request.email,
            password_hash,
            request.display_name.trim().to_owned(),
            role,
        );
        resources.database.create_user(&user).await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        AppLogger::log_auth_event(&user.id.to_string(), "register", true, Some(role.as_str()));

        Self::session_response(&resources, StatusCode::CREATED, user)
    }

    /// Handle user login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let Some(user) = resources.database.get_user_by_email(&request.email).await? else {
            AppLogger::log_auth_event("unknown", "login", false, Some("unknown email"));
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        };

        let password = request.password;
        let password_hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?;

        if !is_valid || !user.is_active {
            let reason = if is_valid { "inactive account" } else { "bad password" };
            AppLogger::log_auth_event(&user.id.to_string(), "login", false, Some(reason));
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        }

        resources.database.update_last_login(user.id).await?;
        AppLogger::log_auth_event(&user.id.to_string(), "login", true, None);

        Self::session_response(&resources, StatusCode::OK, user)
    }

    /// Handle logout by expiring the session cookie
    async fn handle_logout() -> Result<Response, AppError> {
        let cookie = clear_cookie(SESSION_COOKIE)?;
        Ok((
            StatusCode::OK,
            [(header::SET_COOKIE, cookie)],
            Json(serde_json::json!({ "success": true })),
        )
            .into_response())
    }

    /// Handle current user lookup
    async fn handle_me(
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

        Ok((StatusCode::OK, Json(user)).into_response())
    }
}
