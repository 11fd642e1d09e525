// ABOUTME: Security helpers for session handling
// ABOUTME: Groups cookie parsing and Set-Cookie construction for the auth token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Session cookie helpers
pub mod cookies;
