// ABOUTME: In-app notification model and the closed set of notification kinds
// ABOUTME: Notifications are created by domain events and read by their owner only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// What triggered a notification
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone asked to follow the user
    FollowRequest,
    /// A follow request by the user was approved
    FollowApproved,
    /// A trainer assigned a plan
    PlanAssigned,
    /// Direct message received
    NewMessage,
    /// Comment on the user's post
    ForumComment,
    /// Like on the user's post
    ForumLike,
    /// Monthly achievement earned
    AchievementEarned,
    /// Alert on a route the user ran recently
    SafetyAlert,
}

impl NotificationKind {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FollowRequest => "follow_request",
            Self::FollowApproved => "follow_approved",
            Self::PlanAssigned => "plan_assigned",
            Self::NewMessage => "new_message",
            Self::ForumComment => "forum_comment",
            Self::ForumLike => "forum_like",
            Self::AchievementEarned => "achievement_earned",
            Self::SafetyAlert => "safety_alert",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "follow_request" => Self::FollowRequest,
            "follow_approved" => Self::FollowApproved,
            "plan_assigned" => Self::PlanAssigned,
            "new_message" => Self::NewMessage,
            "forum_comment" => Self::ForumComment,
            "forum_like" => Self::ForumLike,
            "achievement_earned" => Self::AchievementEarned,
            "safety_alert" => Self::SafetyAlert,
            _ => {
                return Err(AppError::invalid_input(format!(
                    "Invalid notification kind: {s}"
                )))
            }
        })
    }
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    /// Trigger
    pub kind: NotificationKind,
    /// Short headline
    pub title: String,
    /// Longer text
    pub body: Option<String>,
    /// Ids the client needs to link to the source
    pub data: serde_json::Value,
    /// When the recipient read it
    pub read_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread notification
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        body: Option<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            body,
            data,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}
