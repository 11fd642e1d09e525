// ABOUTME: Direct message route handlers: send, conversation, inbox, unread count
// ABOUTME: Reading a conversation marks the caller's received messages in it as read
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
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    constants::messages::MAX_BODY_LENGTH,
    errors::{AppError, FieldErrors},
    extract::{Json, Path},
    models::{Message, UserSummary},
    resources::ServerResources,
    services::notifications::Notifier,
};

/// Send message request
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Recipient user `ID`
    pub recipient_id: Uuid,
    /// Message text
    pub body: String,
}

/// Conversation with one partner
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    /// The other participant
    pub partner: UserSummary,
    /// Messages, oldest first
    pub messages: Vec<Message>,
}

/// Message routes
pub struct MessageRoutes;

impl MessageRoutes {
    /// Create all message routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/messages", post(Self::handle_send))
            .route("/api/messages/unread-count", get(Self::handle_unread_count))
            .route("/api/conversations", get(Self::handle_inbox))
            .route("/api/conversations/:user_id", get(Self::handle_conversation))
            .with_state(resources)
    }

    async fn handle_send(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let body = request.body.trim().to_owned();
        let mut errors = FieldErrors::new();
        errors.require(
            request.recipient_id != auth.user_id,
            "recipient_id",
            "Cannot message yourself",
        );
        errors.require(
            (1..=MAX_BODY_LENGTH).contains(&body.chars().count()),
            "body",
            format!("Must be between 1 and {MAX_BODY_LENGTH} characters"),
        );
        errors.into_result()?;

        resources
            .database
            .get_user(request.recipient_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::not_found("Recipient"))?;

        let message = Message::new(auth.user_id, request.recipient_id, body);
        resources.database.create_message(&message).await?;

        Notifier::new(&resources.database)
            .new_message(message.recipient_id, auth.user_id, &auth.display_name, message.id)
            .await;
        Ok((StatusCode::CREATED, Json(message)).into_response())
    }

    async fn handle_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(partner_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;

        let partner = resources
            .database
            .get_user(partner_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let now = Utc::now();
        resources
            .database
            .mark_conversation_read(auth.user_id, partner_id, now)
            .await?;
        let messages = resources.database.conversation(auth.user_id, partner_id).await?;

        Ok((
            StatusCode::OK,
            Json(ConversationResponse {
                partner: UserSummary {
                    id: partner.id,
                    display_name: partner.display_name,
                    role: partner.role,
                },
                messages,
            }),
        )
            .into_response())
    }

    async fn handle_inbox(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        let inbox = resources.database.inbox(auth.user_id).await?;
        Ok((StatusCode::OK, Json(inbox)).into_response())
    }

    async fn handle_unread_count(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)
            .await?;
        let count = resources.database.unread_message_count(auth.user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "unread_count": count }))).into_response())
    }
}
