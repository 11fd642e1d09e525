// ABOUTME: Safety and trail alert model with types, severities, and activity rules
// ABOUTME: An alert is active until it is resolved or its expiry passes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Kind of hazard being reported
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Fallen trees, washouts, broken footing
    TrailHazard,
    /// Storms, heat, ice
    Weather,
    /// Animals on or near the route
    Wildlife,
    /// Personal safety concern
    SuspiciousActivity,
    /// Route closed
    Closure,
    /// Anything else
    Other,
}

impl AlertType {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TrailHazard => "trail_hazard",
            Self::Weather => "weather",
            Self::Wildlife => "wildlife",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::Closure => "closure",
            Self::Other => "other",
        }
    }
}

impl FromStr for AlertType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trail_hazard" => Ok(Self::TrailHazard),
            "weather" => Ok(Self::Weather),
            "wildlife" => Ok(Self::Wildlife),
            "suspicious_activity" => Ok(Self::SuspiciousActivity),
            "closure" => Ok(Self::Closure),
            "other" => Ok(Self::Other),
            _ => Err(AppError::invalid_input(format!("Invalid alert type: {s}"))),
        }
    }
}

/// How urgent an alert is
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational
    Low,
    /// Take care
    Medium,
    /// Avoid if possible
    High,
    /// Do not go
    Critical,
}

impl AlertSeverity {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Sort rank stored alongside the severity, higher is more urgent
    #[must_use]
    pub const fn rank(&self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::invalid_input(format!("Invalid severity: {s}"))),
        }
    }
}

/// Reported alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAlert {
    /// Unique identifier
    pub id: Uuid,
    /// Reporting user
    pub reporter_id: Uuid,
    /// Affected route, if any
    pub route_id: Option<Uuid>,
    /// Hazard kind
    pub alert_type: AlertType,
    /// Urgency
    pub severity: AlertSeverity,
    /// Headline
    pub title: String,
    /// Details
    pub description: Option<String>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// After this instant the alert is no longer listed
    pub expires_at: DateTime<Utc>,
    /// When it was resolved
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved it
    pub resolved_by: Option<Uuid>,
    /// Report time
    pub created_at: DateTime<Utc>,
}

impl SafetyAlert {
    /// Unresolved and not yet expired at `now`
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.resolved_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn alert(expires_in: Duration) -> SafetyAlert {
        let now = Utc::now();
        SafetyAlert {
            id: Uuid::new_v4(),
            reporter_id: Uuid::new_v4(),
            route_id: None,
            alert_type: AlertType::Wildlife,
            severity: AlertSeverity::High,
            title: "Bear seen".into(),
            description: None,
            latitude: None,
            longitude: None,
            expires_at: now + expires_in,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
        }
    }

    #[test]
    fn test_alert_activity() {
        let now = Utc::now();
        assert!(alert(Duration::hours(1)).is_active(now));
        assert!(!alert(Duration::hours(-1)).is_active(now));

        let mut resolved = alert(Duration::hours(1));
        resolved.resolved_at = Some(now);
        assert!(!resolved.is_active(now));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::Critical.rank() > AlertSeverity::Low.rank());
    }
}
