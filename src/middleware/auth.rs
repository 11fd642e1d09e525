// ABOUTME: Request authentication from the session cookie or a Bearer token
// ABOUTME: Re-reads the user row on every request so stored role and active flag apply
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::http::{header, HeaderMap};

use crate::auth::{AuthManager, AuthResult};
use crate::constants::auth::SESSION_COOKIE;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::security::cookies::get_cookie_value;

/// Authenticates HTTP requests
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
    database: Arc<Database>,
}

impl AuthMiddleware {
    /// Create new auth middleware
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate request using headers (supports cookies and Authorization header)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No credentials are present (no cookie or header)
    /// - The `Authorization` header is not a Bearer token
    /// - JWT token validation fails
    /// - The user no longer exists or is deactivated
    /// - Database queries fail
    #[tracing::instrument(
        skip(self, headers),
        fields(
            auth_method = tracing::field::Empty,
            user_id = tracing::field::Empty,
            success = tracing::field::Empty,
        )
    )]
    pub async fn authenticate_request_with_headers(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        // Cookie first for browser clients
        if let Some(token) = get_cookie_value(headers, SESSION_COOKIE) {
            tracing::Span::current().record("auth_method", "JWT_COOKIE");
            return Self::record_outcome(self.authenticate_jwt_token(&token).await);
        }

        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            None => {
                tracing::debug!("Request carries neither session cookie nor Authorization header");
                Err(AppError::auth_required())
            }
            Some(value) => {
                if let Some(token) = value.strip_prefix("Bearer ") {
                    tracing::Span::current().record("auth_method", "JWT_TOKEN");
                    Self::record_outcome(self.authenticate_jwt_token(token.trim()).await)
                } else {
                    tracing::Span::current()
                        .record("auth_method", "INVALID")
                        .record("success", false);
                    Err(AppError::auth_invalid(
                        "Invalid authorization header format - must be 'Bearer <token>'",
                    ))
                }
            }
        }
    }

    fn record_outcome(result: AppResult<AuthResult>) -> AppResult<AuthResult> {
        let span = tracing::Span::current();
        match &result {
            Ok(auth) => {
                span.record("user_id", auth.user_id.to_string())
                    .record("success", true);
                tracing::debug!("Authenticated user {}", auth.user_id);
            }
            Err(e) => {
                span.record("success", false);
                tracing::warn!("Authentication failed: {}", e);
            }
        }
        result
    }

    async fn authenticate_jwt_token(&self, token: &str) -> AppResult<AuthResult> {
        let claims = self.auth_manager.validate_token(token)?;

        let user_id = uuid::Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_invalid("Invalid user ID in token"))?;

        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("User for this session no longer exists"))?;

        if !user.is_active {
            AppLogger::log_security_event(
                "inactive_user_session",
                "medium",
                "Session presented for a deactivated account",
                Some(&user_id.to_string()),
            );
            return Err(AppError::auth_invalid("Account is deactivated"));
        }

        Ok(AuthResult::from_user(&user))
    }

    /// Get reference to the auth manager
    #[must_use]
    pub fn auth_manager(&self) -> &AuthManager {
        &self.auth_manager
    }
}
