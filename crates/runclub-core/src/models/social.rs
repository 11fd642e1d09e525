// ABOUTME: Follow graph edge model with pending and approved states
// ABOUTME: Edges start pending and become visible in lists and feeds once approved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// State of a follow edge
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    /// Waiting for the target to approve
    Pending,
    /// Approved by the target
    Approved,
}

impl FollowStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
        }
    }
}

impl FromStr for FollowStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            _ => Err(AppError::invalid_input(format!("Invalid follow status: {s}"))),
        }
    }
}

/// Directed follow edge from `follower_id` to `followed_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    /// Unique identifier
    pub id: Uuid,
    /// Requesting user
    pub follower_id: Uuid,
    /// Target user
    pub followed_id: Uuid,
    /// Edge state
    pub status: FollowStatus,
    /// Request time
    pub created_at: DateTime<Utc>,
    /// Approval time
    pub approved_at: Option<DateTime<Utc>>,
}

impl Follow {
    /// New pending request
    #[must_use]
    pub fn request(follower_id: Uuid, followed_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            follower_id,
            followed_id,
            status: FollowStatus::Pending,
            created_at: Utc::now(),
            approved_at: None,
        }
    }
}

/// Compact user reference used in follow lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id
    pub id: Uuid,
    /// Display name
    pub display_name: String,
    /// Stored role
    pub role: super::UserRole,
}
