// ABOUTME: Configuration module for the RunClub server
// ABOUTME: Environment-only settings; no configuration files are read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment variable parsing and the `ServerConfig` type
pub mod environment;

pub use environment::{AuthConfig, Environment, ServerConfig, UploadConfig};
