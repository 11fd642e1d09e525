// ABOUTME: Monthly achievement evaluation against a user's run totals
// ABOUTME: Awards every met, unearned threshold for the month and notifies the user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::notifications::Notifier;
use crate::database::Database;
use crate::errors::AppResult;
use crate::logging::AppLogger;
use crate::models::{newly_met, Achievement, MonthWindow};

/// Award every achievement newly met in `window` and return them
///
/// Re-running the check for the same month awards nothing twice: the earned
/// set is consulted first, and the insert is a no-op on the unique key.
///
/// # Errors
///
/// Returns an error if loading totals, definitions, or earned rows fails,
/// or an award cannot be stored
pub async fn check_achievements(database: &Database, user_id: Uuid, window: &MonthWindow) -> AppResult<Vec<Achievement>> {
    let period_key = window.period_key();
    let totals = database.month_totals(user_id, window).await?;
    let definitions = database.list_achievements().await?;
    let earned = database.earned_achievement_ids(user_id, &period_key).await?;

    let notifier = Notifier::new(database);
    let now = Utc::now();
    let mut awarded = Vec::new();

    for achievement in newly_met(&definitions, &totals, &earned) {
        let value = totals.value(achievement.metric);
        if database
            .award_achievement(user_id, achievement.id, &period_key, value, now)
            .await?
        {
            info!(
                user_id = %user_id,
                achievement = %achievement.code,
                period = %period_key,
                "Achievement earned"
            );
            AppLogger::log_domain_event("achievement_earned", &user_id.to_string(), &achievement.code);
            notifier.achievement_earned(user_id, achievement, &period_key).await;
            awarded.push(achievement.clone());
        }
    }

    Ok(awarded)
}
