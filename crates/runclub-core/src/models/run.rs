// ABOUTME: Logged run model with derived pace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single logged run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier
    pub id: Uuid,
    /// Runner
    pub user_id: Uuid,
    /// Route the run was on
    pub route_id: Option<Uuid>,
    /// Distance in kilometers
    pub distance_km: f64,
    /// Elapsed time
    pub duration_seconds: i64,
    /// Climb in meters
    pub elevation_gain_m: f64,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Free text
    pub notes: Option<String>,
    /// Logging time
    pub created_at: DateTime<Utc>,
}

impl Run {
    /// Average pace, seconds per kilometer
    #[must_use]
    pub fn pace_seconds_per_km(&self) -> Option<f64> {
        pace_seconds_per_km(self.distance_km, self.duration_seconds)
    }
}

/// Seconds per kilometer, `None` for a zero distance
#[must_use]
pub fn pace_seconds_per_km(distance_km: f64, duration_seconds: i64) -> Option<f64> {
    (distance_km > 0.0).then(|| (duration_seconds as f64 / distance_km * 10.0).round() / 10.0)
}

/// Run with its derived pace for responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunView {
    /// The run
    #[serde(flatten)]
    pub run: Run,
    /// Seconds per kilometer
    pub pace_seconds_per_km: Option<f64>,
}

impl From<Run> for RunView {
    fn from(run: Run) -> Self {
        let pace = run.pace_seconds_per_km();
        Self {
            run,
            pace_seconds_per_km: pace,
        }
    }
}

/// Feed item: a run plus its author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    /// Insertion sequence (`rowid`), the tiebreak inside a cursor position
    #[serde(skip)]
    pub seq: i64,
    /// The run
    #[serde(flatten)]
    pub run: RunView,
    /// Author display name
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace() {
        assert_eq!(pace_seconds_per_km(10.0, 3000), Some(300.0));
        assert_eq!(pace_seconds_per_km(3.0, 1000), Some(333.3));
        assert_eq!(pace_seconds_per_km(0.0, 1000), None);
    }
}
