// ABOUTME: Running route catalog models: routes, ratings, photos, and leaderboard entries
// ABOUTME: Leaderboard ranking keeps each runner's best time and orders ascending
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Route difficulty
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteDifficulty {
    /// Flat, short
    #[default]
    Easy,
    /// Some hills
    Moderate,
    /// Long or steep
    Hard,
}

impl RouteDifficulty {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for RouteDifficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "moderate" => Ok(Self::Moderate),
            "hard" => Ok(Self::Hard),
            _ => Err(AppError::invalid_input(format!(
                "Invalid route difficulty: {s}"
            ))),
        }
    }
}

/// Ground surface
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Paved
    #[default]
    Road,
    /// Dirt or single track
    Trail,
    /// Athletics track
    Track,
    /// Combination
    Mixed,
}

impl Surface {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::Trail => "trail",
            Self::Track => "track",
            Self::Mixed => "mixed",
        }
    }
}

impl FromStr for Surface {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "road" => Ok(Self::Road),
            "trail" => Ok(Self::Trail),
            "track" => Ok(Self::Track),
            "mixed" => Ok(Self::Mixed),
            _ => Err(AppError::invalid_input(format!("Invalid surface: {s}"))),
        }
    }
}

/// A shared running route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningRoute {
    /// Unique identifier
    pub id: Uuid,
    /// User who added it
    pub creator_id: Uuid,
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Area or start point
    pub location: Option<String>,
    /// Length
    pub distance_km: f64,
    /// Total climb
    pub elevation_gain_m: f64,
    /// Difficulty
    pub difficulty: RouteDifficulty,
    /// Surface
    pub surface: Surface,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Route with its rating aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteWithRating {
    /// The route
    #[serde(flatten)]
    pub route: RunningRoute,
    /// Mean rating, `None` when unrated
    pub average_rating: Option<f64>,
    /// Number of ratings
    pub rating_count: i64,
}

/// One user's rating of a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRating {
    /// Unique identifier
    pub id: Uuid,
    /// Rated route
    pub route_id: Uuid,
    /// Rater
    pub user_id: Uuid,
    /// Stars, 1..=5
    pub rating: i64,
    /// Optional text
    pub review: Option<String>,
    /// First rating time
    pub created_at: DateTime<Utc>,
    /// Last change
    pub updated_at: DateTime<Utc>,
}

/// Uploaded route photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePhoto {
    /// Unique identifier
    pub id: Uuid,
    /// Route
    pub route_id: Uuid,
    /// Uploader
    pub user_id: Uuid,
    /// Path relative to the upload directory
    pub file_path: String,
    /// Public URL
    pub url: String,
    /// Caption
    pub caption: Option<String>,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

/// A run that qualifies for a route leaderboard
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardCandidate {
    /// Runner
    pub user_id: Uuid,
    /// Runner display name
    pub display_name: String,
    /// Run
    pub run_id: Uuid,
    /// Elapsed time
    pub duration_seconds: i64,
    /// Start time, earlier wins ties
    pub started_at: DateTime<Utc>,
}

/// Ranked leaderboard row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    /// Runner
    pub user_id: Uuid,
    /// Runner display name
    pub display_name: String,
    /// Best run
    pub run_id: Uuid,
    /// Best time
    pub duration_seconds: i64,
    /// When the best run started
    pub started_at: DateTime<Utc>,
}

/// Keep each runner's fastest run, order by time then start, and take `limit`
#[must_use]
pub fn rank_leaderboard(candidates: Vec<LeaderboardCandidate>, limit: usize) -> Vec<LeaderboardEntry> {
    let mut best: HashMap<Uuid, LeaderboardCandidate> = HashMap::new();
    for candidate in candidates {
        match best.get(&candidate.user_id) {
            Some(current)
                if (current.duration_seconds, current.started_at)
                    <= (candidate.duration_seconds, candidate.started_at) => {}
            _ => {
                best.insert(candidate.user_id, candidate);
            }
        }
    }

    let mut ranked: Vec<_> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        a.duration_seconds
            .cmp(&b.duration_seconds)
            .then(a.started_at.cmp(&b.started_at))
            .then(a.user_id.cmp(&b.user_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, c)| LeaderboardEntry {
            rank: i + 1,
            user_id: c.user_id,
            display_name: c.display_name,
            run_id: c.run_id,
            duration_seconds: c.duration_seconds,
            started_at: c.started_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candidate(user: Uuid, seconds: i64, started_offset_min: i64) -> LeaderboardCandidate {
        LeaderboardCandidate {
            user_id: user,
            display_name: "runner".into(),
            run_id: Uuid::new_v4(),
            duration_seconds: seconds,
            started_at: DateTime::from_timestamp(1_760_000_000, 0).unwrap()
                + Duration::minutes(started_offset_min),
        }
    }

    #[test]
    fn test_one_entry_per_runner_with_best_time() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let board = rank_leaderboard(
            vec![
                candidate(a, 1500, 0),
                candidate(b, 1400, 0),
                candidate(a, 1300, 10),
            ],
            10,
        );
        assert_eq!(board.len(), 2);
        assert_eq!((board[0].rank, board[0].user_id, board[0].duration_seconds), (1, a, 1300));
        assert_eq!((board[1].rank, board[1].user_id), (2, b));
    }

    #[test]
    fn test_ties_go_to_earlier_start() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let board = rank_leaderboard(vec![candidate(a, 1200, 30), candidate(b, 1200, 5)], 10);
        assert_eq!(board[0].user_id, b);
        assert_eq!(board[1].user_id, a);
    }

    #[test]
    fn test_limit_applies_after_dedup() {
        let runners: Vec<_> = (0..5).map(|_| Uuid::new_v4()).collect();
        let candidates = runners
            .iter()
            .enumerate()
            .map(|(i, id)| candidate(*id, 1000 + i64::try_from(i).unwrap(), 0))
            .collect();
        let board = rank_leaderboard(candidates, 3);
        assert_eq!(board.len(), 3);
        assert_eq!(board[2].rank, 3);
    }
}
