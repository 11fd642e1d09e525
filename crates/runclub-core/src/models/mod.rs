// ABOUTME: Domain models shared by the database layer and HTTP routes
// ABOUTME: Re-exports every model so callers can use runclub_core::models::Type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Monthly achievements
pub mod achievement;
/// Forum posts and comments
pub mod forum;
/// Direct messages
pub mod message;
/// Notifications
pub mod notification;
/// Running routes and leaderboards
pub mod route;
/// Logged runs
pub mod run;
/// Safety alerts
pub mod safety;
/// Follow graph
pub mod social;
/// Training plans and assignments
pub mod training;
/// Users and profiles
pub mod user;

pub use achievement::{
    default_achievements, newly_met, parse_period_key, Achievement, AchievementMetric,
    MonthTotals, MonthWindow, UserAchievement,
};
pub use forum::{ForumCategory, ForumComment, ForumPost, ForumPostSummary};
pub use message::{ConversationSummary, Message};
pub use notification::{Notification, NotificationKind};
pub use route::{
    rank_leaderboard, LeaderboardCandidate, LeaderboardEntry, RouteDifficulty, RouteRating,
    RoutePhoto, RouteWithRating, RunningRoute, Surface,
};
pub use run::{pace_seconds_per_km, FeedItem, Run, RunView};
pub use safety::{AlertSeverity, AlertType, SafetyAlert};
pub use social::{Follow, FollowStatus, UserSummary};
pub use training::{
    completion_percentage, current_week, validate_duration_weeks, AssignmentAction,
    AssignmentProgress, AssignmentStatus, CompletedWorkout, NextWorkout, PlanAssignment,
    PlanDifficulty, PlanWeek, PlannedWorkout, TrainingPlan, WeekProgress, WeeklyStructure,
    WorkoutKind,
};
pub use user::{is_valid_email, normalize_email, ExperienceLevel, Profile, User, UserRole};
