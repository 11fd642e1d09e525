// ABOUTME: Domain service layer for operations that span several tables
// ABOUTME: Achievement checks, notification fan-out, and assignment lifecycle rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Route handlers stay thin: they authenticate, validate input, and call into
//! these functions whenever an operation touches more than one domain.

/// Monthly achievement evaluation and awarding
pub mod achievements;

/// Plan assignment creation and status changes
pub mod assignments;

/// Notification creation helpers per event kind
pub mod notifications;

/// Safety alert fan-out to recent route runners
pub mod safety;
