// ABOUTME: HTTP middleware for authentication, role-gated pages, CORS, and request tracing
// ABOUTME: Re-exports the helpers the router and handlers use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod auth;
pub mod cors;
pub mod role_guard;
pub mod tracing;

// Authentication middleware
pub use auth::AuthMiddleware;

// CORS configuration
pub use cors::setup_cors;

// Page guards
pub use role_guard::{require_page_role, PageGuard};

// Request tracing
pub use tracing::{request_id_layers, trace_layer, REQUEST_ID_HEADER};
