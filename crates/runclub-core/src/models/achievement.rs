// ABOUTME: Monthly achievement definitions, earned achievements, and threshold evaluation
// ABOUTME: Period keys are calendar months formatted as YYYY-MM in UTC
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Aggregated quantity an achievement is measured on
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementMetric {
    /// Sum of run distance in kilometers
    DistanceKm,
    /// Sum of elevation gain in meters
    ElevationM,
}

impl AchievementMetric {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DistanceKm => "distance_km",
            Self::ElevationM => "elevation_m",
        }
    }
}

impl FromStr for AchievementMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance_km" => Ok(Self::DistanceKm),
            "elevation_m" => Ok(Self::ElevationM),
            _ => Err(AppError::invalid_input(format!(
                "Invalid achievement metric: {s}"
            ))),
        }
    }
}

/// Achievement definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    /// Unique identifier
    pub id: Uuid,
    /// Stable machine name, e.g. `monthly_distance_100`
    pub code: String,
    /// Display name
    pub name: String,
    /// What it takes
    pub description: String,
    /// Measured quantity
    pub metric: AchievementMetric,
    /// Value that must be reached
    pub threshold: f64,
    /// Evaluation period; only `monthly` exists
    pub period: String,
}

/// An achievement earned for a specific period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    /// Unique identifier
    pub id: Uuid,
    /// Earner
    pub user_id: Uuid,
    /// Definition
    pub achievement: Achievement,
    /// `YYYY-MM`
    pub period_key: String,
    /// Aggregated value at the time it was earned
    pub value: f64,
    /// Award time
    pub earned_at: DateTime<Utc>,
}

/// Month totals used for evaluation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthTotals {
    /// Kilometers run
    pub distance_km: f64,
    /// Meters climbed
    pub elevation_m: f64,
    /// Number of runs
    pub run_count: i64,
}

impl MonthTotals {
    /// Value of `metric`
    #[must_use]
    pub const fn value(&self, metric: AchievementMetric) -> f64 {
        match metric {
            AchievementMetric::DistanceKm => self.distance_km,
            AchievementMetric::ElevationM => self.elevation_m,
        }
    }
}

/// Half-open UTC interval `[start, end)` covering one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// First instant of the month
    pub start: DateTime<Utc>,
    /// First instant of the following month
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// Window of the month containing `at`
    ///
    /// # Errors
    ///
    /// Returns an error if the month boundary cannot be represented
    pub fn containing(at: DateTime<Utc>) -> AppResult<Self> {
        Self::for_month(at.year(), at.month())
    }

    /// Window of `year`-`month`
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid month
    pub fn for_month(year: i32, month: u32) -> AppResult<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::invalid_input(format!("Invalid month {year}-{month}")))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| AppError::invalid_input(format!("Invalid month {year}-{month}")))?;
        Ok(Self {
            start: Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&next.and_time(chrono::NaiveTime::MIN)),
        })
    }

    /// `YYYY-MM`
    #[must_use]
    pub fn period_key(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

/// Parse a `YYYY-MM` period key into its window
///
/// # Errors
///
/// Returns an error if the key is malformed
pub fn parse_period_key(key: &str) -> AppResult<MonthWindow> {
    let invalid = || AppError::invalid_input(format!("Invalid month '{key}', expected YYYY-MM"));
    let (year, month) = key.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    MonthWindow::for_month(year, month).map_err(|_| invalid())
}

/// Definitions seeded at startup: `(code, name, metric, threshold)`
pub const MONTHLY_ACHIEVEMENTS: &[(&str, &str, AchievementMetric, f64)] = &[
    ("monthly_distance_50", "50 km Month", AchievementMetric::DistanceKm, 50.0),
    ("monthly_distance_100", "100 km Month", AchievementMetric::DistanceKm, 100.0),
    ("monthly_distance_200", "200 km Month", AchievementMetric::DistanceKm, 200.0),
    ("monthly_elevation_500", "500 m Climber", AchievementMetric::ElevationM, 500.0),
    ("monthly_elevation_1000", "1000 m Climber", AchievementMetric::ElevationM, 1000.0),
    ("monthly_elevation_2500", "2500 m Climber", AchievementMetric::ElevationM, 2500.0),
];

/// Build the seeded definitions
#[must_use]
pub fn default_achievements() -> Vec<Achievement> {
    MONTHLY_ACHIEVEMENTS
        .iter()
        .map(|&(code, name, metric, threshold)| {
            let unit = match metric {
                AchievementMetric::DistanceKm => "km",
                AchievementMetric::ElevationM => "m of elevation",
            };
            Achievement {
                id: Uuid::new_v4(),
                code: code.to_owned(),
                name: name.to_owned(),
                description: format!("Log {threshold} {unit} within a calendar month"),
                metric,
                threshold,
                period: "monthly".to_owned(),
            }
        })
        .collect()
}

/// Definitions whose threshold `totals` meets and that are not in `already_earned`
#[must_use]
pub fn newly_met<'a>(
    definitions: &'a [Achievement],
    totals: &MonthTotals,
    already_earned: &HashSet<Uuid>,
) -> Vec<&'a Achievement> {
    definitions
        .iter()
        .filter(|a| !already_earned.contains(&a.id))
        .filter(|a| totals.value(a.metric) >= a.threshold)
        .collect()
}
