// ABOUTME: Forum post, comment, and listing models
// ABOUTME: Categories are a closed set shared by validation and filtering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Forum category
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForumCategory {
    /// Anything else
    #[default]
    General,
    /// Workouts and plans
    Training,
    /// Shoes and equipment
    Gear,
    /// Race reports and calendars
    Races,
    /// Fueling
    Nutrition,
    /// Injury and recovery
    Injuries,
}

impl ForumCategory {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Training => "training",
            Self::Gear => "gear",
            Self::Races => "races",
            Self::Nutrition => "nutrition",
            Self::Injuries => "injuries",
        }
    }
}

impl FromStr for ForumCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "training" => Ok(Self::Training),
            "gear" => Ok(Self::Gear),
            "races" => Ok(Self::Races),
            "nutrition" => Ok(Self::Nutrition),
            "injuries" => Ok(Self::Injuries),
            _ => Err(AppError::invalid_input(format!("Invalid forum category: {s}"))),
        }
    }
}

/// Forum post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPost {
    /// Unique identifier
    pub id: Uuid,
    /// Author
    pub author_id: Uuid,
    /// Category
    pub category: ForumCategory,
    /// Title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last edit
    pub updated_at: DateTime<Utc>,
}

/// Post as shown in listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPostSummary {
    /// Insertion sequence (`rowid`), the tiebreak inside a cursor position
    #[serde(skip)]
    pub seq: i64,
    /// The post
    #[serde(flatten)]
    pub post: ForumPost,
    /// Author display name
    pub author_name: String,
    /// Number of comments
    pub comment_count: i64,
    /// Number of likes
    pub like_count: i64,
    /// Whether the viewer liked the post
    pub liked_by_viewer: bool,
}

/// Comment on a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumComment {
    /// Unique identifier
    pub id: Uuid,
    /// Parent post
    pub post_id: Uuid,
    /// Author
    pub author_id: Uuid,
    /// Author display name
    pub author_name: String,
    /// Comment text
    pub body: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
