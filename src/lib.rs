// ABOUTME: Main library entry point for the RunClub server
// ABOUTME: Wires configuration, database, auth, and HTTP routes for runners and trainers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # RunClub Server
//!
//! HTTP backend for a running club: training plans assigned by trainers,
//! run logging, route leaderboards, a follow graph with an activity feed,
//! forums, direct messages, monthly achievements and safety alerts.
//!
//! ## Architecture
//!
//! - **config**: Environment-only server configuration
//! - **database**: `SQLite` persistence through sqlx, one file per domain
//! - **auth**: bcrypt password hashing and HS256 session tokens
//! - **middleware**: Request authentication, role guards, CORS, request ids
//! - **services**: Cross-domain operations (achievement checks, notifications)
//! - **routes**: Axum routers grouped by domain
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use runclub_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("RunClub configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Password hashing and JWT session tokens
pub mod auth;

/// Environment-based configuration
pub mod config;

/// `SQLite` persistence layer
pub mod database;

/// Unified error types re-exported from the core crate
pub mod errors;

/// Extractors that reject with the JSON error envelope
pub mod extract;

/// Structured logging setup
pub mod logging;

/// Authentication, authorization, and HTTP layers
pub mod middleware;

/// Shared server state handed to every router
pub mod resources;

/// HTTP route handlers grouped by domain
pub mod routes;

/// Cookie helpers for session handling
pub mod security;

/// HTTP server bootstrap
pub mod server;

/// Cross-domain business operations
pub mod services;

/// Upload storage
pub mod storage;

pub use runclub_core::{constants, models, pagination};
