// ABOUTME: Admin route handlers for changing stored roles and account activation
// ABOUTME: Every handler requires the admin role and refuses to act on the caller's own account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthResult;
use crate::errors::{AppError, AppResult};
use crate::extract::{Json, Path};
use crate::logging::AppLogger;
use crate::models::UserRole;
use crate::resources::ServerResources;

/// Role change request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New stored role
    pub role: UserRole,
}

/// Activation change request
#[derive(Debug, Deserialize)]
pub struct UpdateActiveRequest {
    /// Whether the account may log in
    pub is_active: bool,
}

/// Admin routes
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/users/:id/role", put(Self::handle_update_role))
            .route("/api/admin/users/:id/active", put(Self::handle_update_active))
            .with_state(resources)
    }

    async fn authenticate_admin(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AuthResult> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(headers)
            .await?;
        auth.require_role(&[UserRole::Admin])?;
        Ok(auth)
    }

    fn refuse_self(auth: &AuthResult, target: Uuid) -> AppResult<()> {
        if auth.user_id == target {
            return Err(AppError::invalid_input("Admins cannot change their own account"));
        }
        Ok(())
    }

    async fn handle_update_role(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<Uuid>,
        Json(request): Json<UpdateRoleRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate_admin(&headers, &resources).await?;
        Self::refuse_self(&auth, user_id)?;

        resources.database.update_user_role(user_id, request.role).await?;
        AppLogger::log_security_event(
            "role_changed",
            "medium",
            &format!("user {user_id} is now {}", request.role),
            Some(&auth.user_id.to_string()),
        );

        let user = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }

    async fn handle_update_active(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<Uuid>,
        Json(request): Json<UpdateActiveRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate_admin(&headers, &resources).await?;
        Self::refuse_self(&auth, user_id)?;

        resources
            .database
            .set_user_active(user_id, request.is_active)
            .await?;
        AppLogger::log_security_event(
            if request.is_active { "account_activated" } else { "account_deactivated" },
            "medium",
            &format!("user {user_id}"),
            Some(&auth.user_id.to_string()),
        );

        let user = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }
}
