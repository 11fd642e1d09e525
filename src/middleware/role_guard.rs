// ABOUTME: Role guard for page routes that redirects instead of returning JSON errors
// ABOUTME: Visitors without a valid session go to /login and users with another role go to their own dashboard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Page Role Guard
//!
//! API handlers reject a wrong role with `403 PERMISSION_DENIED`. Page routes
//! are navigated to by browsers, so the guard answers with a `303 See Other`
//! to the place the user belongs instead. On success the authenticated
//! [`AuthResult`] is stored in the request extensions for the handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::AuthResult;
use crate::errors::ErrorCode;
use crate::models::UserRole;
use crate::resources::ServerResources;

/// Path visitors without a valid session are sent to
pub const LOGIN_PATH: &str = "/login";

/// State for [`require_page_role`]: shared resources plus the required role
#[derive(Clone)]
pub struct PageGuard {
    /// Shared server resources
    pub resources: Arc<ServerResources>,
    /// Role the page is reserved for
    pub role: UserRole,
}

impl PageGuard {
    /// Guard for pages reserved to `role`
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>, role: UserRole) -> Self {
        Self { resources, role }
    }
}

/// Missing or rejected credentials send the visitor to log in; anything
/// else is a server failure and keeps its error response
const fn is_credential_failure(code: ErrorCode) -> bool {
    matches!(code, ErrorCode::AuthRequired | ErrorCode::AuthInvalid | ErrorCode::AuthExpired)
}

/// Middleware that admits only users whose stored role equals the guard's
pub async fn require_page_role(State(guard): State<PageGuard>, mut request: Request, next: Next) -> Response {
    let auth = match guard
        .resources
        .auth_middleware
        .authenticate_request_with_headers(request.headers())
        .await
    {
        Ok(auth) => auth,
        Err(e) if is_credential_failure(e.code) => return Redirect::to(LOGIN_PATH).into_response(),
        Err(e) => return e.into_response(),
    };

    if auth.role != guard.role {
        tracing::debug!(
            user_id = %auth.user_id,
            role = %auth.role,
            required = %guard.role,
            "Redirecting to the user's own dashboard"
        );
        return Redirect::to(auth.role.dashboard_path()).into_response();
    }

    request.extensions_mut().insert::<AuthResult>(auth);
    next.run(request).await
}
