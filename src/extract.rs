// ABOUTME: Request extractors whose rejections use the JSON error envelope
// ABOUTME: Drop-in Json, Path, and Query wrappers around the axum extractors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Envelope-aware extractors
//!
//! axum's own extractors reject malformed input with a plain-text body.
//! These wrappers run the same extraction but convert the rejection into an
//! [`AppError`], so a broken body or query string gets the same
//! `{"error": {...}}` response as every handler error.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::errors::AppError;

/// JSON request body, also usable as a JSON response
#[derive(Debug, Clone, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Typed path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Typed query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
