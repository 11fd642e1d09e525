// ABOUTME: Safety alert fan-out to runners who recently used the affected route
// ABOUTME: Looks back a fixed window from the alert's creation and skips the reporter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Duration;

use super::notifications::Notifier;
use crate::constants::safety::RECENT_ROUTE_USER_DAYS;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::SafetyAlert;

/// Notify everyone other than the reporter who ran the alert's route recently
///
/// Returns how many users were notified; alerts without a route notify nobody.
///
/// # Errors
///
/// Returns an error if the recent runner lookup fails
pub async fn notify_recent_route_runners(database: &Database, alert: &SafetyAlert) -> AppResult<usize> {
    let Some(route_id) = alert.route_id else {
        return Ok(0);
    };

    let since = alert.created_at - Duration::days(RECENT_ROUTE_USER_DAYS);
    let runners = database
        .recent_route_runners(route_id, since, alert.reporter_id)
        .await?;

    let notifier = Notifier::new(database);
    for runner_id in &runners {
        notifier.safety_alert(*runner_id, alert).await;
    }

    tracing::info!(
        alert_id = %alert.id,
        route_id = %route_id,
        notified = runners.len(),
        "Safety alert fan-out complete"
    );
    Ok(runners.len())
}
