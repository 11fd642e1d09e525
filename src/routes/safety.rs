// ABOUTME: Safety alert route handlers: report, list active, and resolve
// ABOUTME: Reports on a route notify runners who used it recently; resolving twice is a conflict
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    constants::safety::{DEFAULT_EXPIRY_HOURS, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MIN_TITLE_LENGTH},
    errors::{AppError, AppResult, FieldErrors},
    extract::{Json, Path, Query},
    logging::AppLogger,
    models::{AlertSeverity, AlertType, SafetyAlert, UserRole},
    resources::ServerResources,
    services::safety::notify_recent_route_runners,
};

/// Alert report request
#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    /// Kind of hazard
    pub alert_type: AlertType,
    /// How serious it is
    pub severity: AlertSeverity,
    /// Short summary
    pub title: String,
    /// Details
    #[serde(default)]
    pub description: Option<String>,
    /// Affected route
    #[serde(default)]
    pub route_id: Option<Uuid>,
    /// Latitude of the hazard
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude of the hazard
    #[serde(default)]
    pub longitude: Option<f64>,
    /// When the alert lapses, 48 hours from now when omitted
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateAlertRequest {
    fn into_alert(self, reporter_id: Uuid, now: DateTime<Utc>) -> AppResult<SafetyAlert> {
        let mut errors = FieldErrors::new();
        let title = self.title.trim().to_owned();
        errors.require(
            (MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&title.chars().count()),
            "title",
            format!("Must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters"),
        );
        let description = self.description.map(|d| d.trim().to_owned()).filter(|d| !d.is_empty());
        errors.require(
            description
                .as_ref()
                .is_none_or(|d| d.chars().count() <= MAX_DESCRIPTION_LENGTH),
            "description",
            format!("Must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
        errors.require(
            self.latitude.is_none_or(|lat| (-90.0..=90.0).contains(&lat)),
            "latitude",
            "Must be between -90 and 90",
        );
        errors.require(
            self.longitude.is_none_or(|lng| (-180.0..=180.0).contains(&lng)),
            "longitude",
            "Must be between -180 and 180",
        );
        errors.require(
            self.latitude.is_some() == self.longitude.is_some(),
            "latitude",
            "Latitude and longitude must be given together",
        );
        let expires_at = self
            .expires_at
            .unwrap_or(now + Duration::hours(DEFAULT_EXPIRY_HOURS));
        errors.require(expires_at > now, "expires_at", "Must be in the future");
        errors.into_result()?;

        Ok(SafetyAlert {
            id: Uuid::new_v4(),
            reporter_id,
            route_id: self.route_id,
            alert_type: self.alert_type,
            severity: self.severity,
            title,
            description,
            latitude: self.latitude,
            longitude: self.longitude,
            expires_at,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
        })
    }
}

/// Active alert listing query
#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    /// Only alerts on this route
    pub route_id: Option<Uuid>,
}

/// Created alert and how many runners were told
#[derive(Debug, Serialize)]
pub struct CreateAlertResponse {
    /// The stored alert
    pub alert: SafetyAlert,
    /// Runners notified about it
    pub notified_users: usize,
}

/// Safety alert routes
pub struct SafetyRoutes;

impl SafetyRoutes {
    /// Create all safety alert routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/safety-alerts",
                get(Self::handle_list_active).post(Self::handle_create),
            )
            .route("/api/safety-alerts/:id/resolve", post(Self::handle_resolve))
            .with_state(resources)
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateAlertRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let alert = request.into_alert(auth.user_id, Utc::now())?;
        if let Some(route_id) = alert.route_id {
            if !resources.database.route_exists(route_id).await? {
                return Err(AppError::not_found("Route"));
            }
        }
        resources.database.create_alert(&alert).await?;
        AppLogger::log_domain_event("safety_alert_raised", &auth.user_id.to_string(), &alert.id.to_string());

        let notified_users = notify_recent_route_runners(&resources.database, &alert).await?;
        Ok((
            StatusCode::CREATED,
            Json(CreateAlertResponse {
                alert,
                notified_users,
            }),
        )
            .into_response())
    }

    async fn handle_list_active(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<AlertListQuery>,
    ) -> Result<Response, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let alerts = resources
            .database
            .list_active_alerts(Utc::now(), query.route_id)
            .await?;
        Ok((StatusCode::OK, Json(alerts)).into_response())
    }

    async fn handle_resolve(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(alert_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let alert = resources
            .database
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| AppError::not_found("Safety alert"))?;
        if alert.reporter_id != auth.user_id && !matches!(auth.role, UserRole::Trainer | UserRole::Admin) {
            return Err(AppError::permission_denied(
                "Only the reporter, a trainer, or an admin can resolve an alert",
            ));
        }

        if alert.resolved_at.is_some()
            || !resources
                .database
                .resolve_alert(alert.id, auth.user_id, Utc::now())
                .await?
        {
            return Err(AppError::invalid_state("Safety alert is already resolved"));
        }
        AppLogger::log_domain_event("safety_alert_resolved", &auth.user_id.to_string(), &alert.id.to_string());

        let resolved = resources
            .database
            .get_alert(alert.id)
            .await?
            .ok_or_else(|| AppError::not_found("Safety alert"))?;
        Ok((StatusCode::OK, Json(resolved)).into_response())
    }
}
