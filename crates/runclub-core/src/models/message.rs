// ABOUTME: Direct message model and inbox conversation summary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direct message between two users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,
    /// Sender
    pub sender_id: Uuid,
    /// Recipient
    pub recipient_id: Uuid,
    /// Text
    pub body: String,
    /// When the recipient read it
    pub read_at: Option<DateTime<Utc>>,
    /// Send time
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build an unread message
    #[must_use]
    pub fn new(sender_id: Uuid, recipient_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            body,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}

/// One inbox row per conversation partner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// The other participant
    pub partner_id: Uuid,
    /// Their display name
    pub partner_name: String,
    /// Most recent message either way
    pub last_message: Message,
    /// Messages from the partner the caller has not read
    pub unread_count: i64,
}
