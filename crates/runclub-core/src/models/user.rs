// ABOUTME: User account and profile models with stored roles
// ABOUTME: Roles drive dashboard redirects and permission checks across the API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Stored role of a user account
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Logs runs, follows plans
    #[default]
    Runner,
    /// Authors training plans and assigns them
    Trainer,
    /// Platform moderator
    Admin,
}

impl UserRole {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Runner => "runner",
            Self::Trainer => "trainer",
            Self::Admin => "admin",
        }
    }

    /// Dashboard page this role lands on
    #[must_use]
    pub const fn dashboard_path(&self) -> &'static str {
        match self {
            Self::Runner => "/runner/dashboard",
            Self::Trainer => "/trainer/dashboard",
            Self::Admin => "/admin/dashboard",
        }
    }

    /// Whether the role can be chosen at registration
    #[must_use]
    pub const fn is_self_assignable(&self) -> bool {
        matches!(self, Self::Runner | Self::Trainer)
    }

    /// Admins bypass ownership checks
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runner" => Ok(Self::Runner),
            "trainer" => Ok(Self::Trainer),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::invalid_input(format!("Invalid role: {s}"))),
        }
    }
}

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login email, stored lower-cased
    pub email: String,
    /// Name shown to other users
    pub display_name: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored role
    pub role: UserRole,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new active user
    #[must_use]
    pub fn new(email: &str, password_hash: String, display_name: String, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            display_name,
            password_hash,
            role,
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }
}

/// Normalize an email for storage and lookup
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email shape check: local part, `@`, dotted domain
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() <= 5 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Self-reported running experience
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    /// Less than a year of running
    Beginner,
    /// Regular runner
    Intermediate,
    /// Races regularly
    Advanced,
    /// Competitive
    Elite,
}

impl ExperienceLevel {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Elite => "elite",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "elite" => Ok(Self::Elite),
            _ => Err(AppError::invalid_input(format!(
                "Invalid experience level: {s}"
            ))),
        }
    }
}

/// Runner/trainer profile, one per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user
    pub user_id: Uuid,
    /// Free-form bio
    pub bio: Option<String>,
    /// Home area
    pub location: Option<String>,
    /// Experience level
    pub experience_level: Option<ExperienceLevel>,
    /// Weekly distance goal in kilometers
    pub weekly_goal_km: Option<f64>,
    /// Avatar path relative to the upload directory
    pub avatar_path: Option<String>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile created at registration
    #[must_use]
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            bio: None,
            location: None,
            experience_level: None,
            weekly_goal_km: None,
            avatar_path: None,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("runner@example.com"));
        assert!(!is_valid_email("runner@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("run ner@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("a@.com"));
    }

    #[test]
    fn test_admin_cannot_self_register() {
        assert!(UserRole::Runner.is_self_assignable());
        assert!(UserRole::Trainer.is_self_assignable());
        assert!(!UserRole::Admin.is_self_assignable());
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new(" Runner@Example.COM ", "hash".into(), "R".into(), UserRole::Runner);
        assert_eq!(user.email, "runner@example.com");
        assert!(user.is_active);
    }
}
