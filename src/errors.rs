// ABOUTME: Re-exports the unified error types from runclub-core
// ABOUTME: Keeps crate::errors paths stable for handlers and database code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use runclub_core::errors::{
    AppError, AppResult, ErrorCode, ErrorResponse, ErrorResponseDetails, FieldErrors,
};
