// ABOUTME: Core types and constants for the RunClub training and social platform
// ABOUTME: Foundation crate with error handling, domain models, pagination, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # RunClub Core
//!
//! Foundation crate providing shared types for the RunClub server. Nothing in
//! here touches the network or the database directly, so the crate changes
//! rarely and keeps workspace rebuilds incremental.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `FieldErrors`
//! - **constants**: Validation limits and defaults organized by domain
//! - **pagination**: Cursor-based pagination for feeds and forum listings
//! - **models**: Domain models (users, plans, follows, forum, achievements, alerts)

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and validation limits organized by domain
pub mod constants;

/// Cursor-based pagination for efficient data traversal
pub mod pagination;

/// Core domain models and progress arithmetic
pub mod models;
