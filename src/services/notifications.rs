// ABOUTME: Notification creation helpers, one per domain event
// ABOUTME: Delivery failures are logged and never fail the action that caused them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::database::Database;
use crate::models::{Achievement, ForumPost, Notification, NotificationKind, SafetyAlert, TrainingPlan};

/// Creates notifications for domain events
pub struct Notifier<'a> {
    database: &'a Database,
}

impl<'a> Notifier<'a> {
    /// Notifier writing through `database`
    #[must_use]
    pub const fn new(database: &'a Database) -> Self {
        Self { database }
    }

    /// Store a notification; a failure is logged and swallowed
    pub async fn send(&self, notification: Notification) {
        if let Err(e) = self.database.create_notification(&notification).await {
            warn!(
                user_id = %notification.user_id,
                kind = notification.kind.as_str(),
                "Failed to create notification: {}",
                e
            );
        }
    }

    /// Someone asked to follow `target_id`
    pub async fn follow_request(&self, target_id: Uuid, follow_id: Uuid, requester_id: Uuid, requester_name: &str) {
        self.send(Notification::new(
            target_id,
            NotificationKind::FollowRequest,
            format!("{requester_name} wants to follow you"),
            None,
            json!({ "follow_id": follow_id, "user_id": requester_id }),
        ))
        .await;
    }

    /// `target_name` approved the follow request of `requester_id`
    pub async fn follow_approved(&self, requester_id: Uuid, target_id: Uuid, target_name: &str) {
        self.send(Notification::new(
            requester_id,
            NotificationKind::FollowApproved,
            format!("{target_name} approved your follow request"),
            None,
            json!({ "user_id": target_id }),
        ))
        .await;
    }

    /// A plan was assigned to a runner
    pub async fn plan_assigned(&self, runner_id: Uuid, assignment_id: Uuid, plan: &TrainingPlan) {
        self.send(Notification::new(
            runner_id,
            NotificationKind::PlanAssigned,
            format!("You have been assigned \"{}\"", plan.title),
            plan.description.clone(),
            json!({ "assignment_id": assignment_id, "plan_id": plan.id }),
        ))
        .await;
    }

    /// A direct message arrived
    pub async fn new_message(&self, recipient_id: Uuid, sender_id: Uuid, sender_name: &str, message_id: Uuid) {
        self.send(Notification::new(
            recipient_id,
            NotificationKind::NewMessage,
            format!("New message from {sender_name}"),
            None,
            json!({ "message_id": message_id, "sender_id": sender_id }),
        ))
        .await;
    }

    /// Someone commented on a post
    pub async fn forum_comment(&self, post: &ForumPost, commenter_name: &str, comment_id: Uuid) {
        self.send(Notification::new(
            post.author_id,
            NotificationKind::ForumComment,
            format!("{commenter_name} commented on \"{}\"", post.title),
            None,
            json!({ "post_id": post.id, "comment_id": comment_id }),
        ))
        .await;
    }

    /// Someone liked a post
    pub async fn forum_like(&self, post: &ForumPost, liker_id: Uuid, liker_name: &str) {
        self.send(Notification::new(
            post.author_id,
            NotificationKind::ForumLike,
            format!("{liker_name} liked \"{}\"", post.title),
            None,
            json!({ "post_id": post.id, "user_id": liker_id }),
        ))
        .await;
    }

    /// An achievement was earned for a month
    pub async fn achievement_earned(&self, user_id: Uuid, achievement: &Achievement, period_key: &str) {
        self.send(Notification::new(
            user_id,
            NotificationKind::AchievementEarned,
            format!("Achievement unlocked: {}", achievement.name),
            Some(achievement.description.clone()),
            json!({ "achievement_code": achievement.code, "period_key": period_key }),
        ))
        .await;
    }

    /// A safety alert was raised on a route the user ran
    pub async fn safety_alert(&self, user_id: Uuid, alert: &SafetyAlert) {
        self.send(Notification::new(
            user_id,
            NotificationKind::SafetyAlert,
            format!("Safety alert: {}", alert.title),
            alert.description.clone(),
            json!({
                "alert_id": alert.id,
                "route_id": alert.route_id,
                "severity": alert.severity.as_str(),
            }),
        ))
        .await;
    }
}
