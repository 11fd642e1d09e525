// ABOUTME: Direct message database operations: send, conversation, inbox, unread counts
// ABOUTME: The inbox groups messages by conversation partner using a window function
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ConversationSummary, Message};

impl Database {
    pub(super) async fn migrate_messages(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS messages (
                    id TEXT PRIMARY KEY,
                    sender_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    recipient_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    body TEXT NOT NULL,
                    read_at TEXT,
                    created_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, recipient_id, created_at)",
                "CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient_id, read_at)",
            ],
            "messages",
        )
        .await
    }

    /// Insert a message
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_message(&self, message: &Message) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO messages (id, sender_id, recipient_id, body, read_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(message.id.to_string())
        .bind(message.sender_id.to_string())
        .bind(message.recipient_id.to_string())
        .bind(&message.body)
        .bind(message.read_at.map(fmt_ts))
        .bind(fmt_ts(message.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to send message: {e}")))?;

        Ok(message.id)
    }

    /// Messages between two users in chronological order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn conversation(&self, user_id: Uuid, partner_id: Uuid) -> AppResult<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, recipient_id, body, read_at, created_at FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2) OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(partner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load conversation: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// Mark messages from `partner_id` to `user_id` read
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_conversation_read(&self, user_id: Uuid, partner_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE messages SET read_at = $1
            WHERE recipient_id = $2 AND sender_id = $3 AND read_at IS NULL
            ",
        )
        .bind(fmt_ts(at))
        .bind(user_id.to_string())
        .bind(partner_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark messages read: {e}")))?;
        Ok(result.rows_affected())
    }

    /// One entry per conversation partner, newest conversation first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn inbox(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT m.id, m.sender_id, m.recipient_id, m.body, m.read_at, m.created_at,
                   m.partner_id, u.display_name AS partner_name,
                   (SELECT COUNT(*) FROM messages unread
                    WHERE unread.sender_id = m.partner_id AND unread.recipient_id = $1
                      AND unread.read_at IS NULL) AS unread_count
            FROM (
                SELECT msg.*, msg.rowid AS seq,
                       CASE WHEN msg.sender_id = $1 THEN msg.recipient_id ELSE msg.sender_id END AS partner_id,
                       ROW_NUMBER() OVER (
                           PARTITION BY CASE WHEN msg.sender_id = $1 THEN msg.recipient_id ELSE msg.sender_id END
                           ORDER BY msg.created_at DESC, msg.rowid DESC
                       ) AS rn
                FROM messages msg
                WHERE msg.sender_id = $1 OR msg.recipient_id = $1
            ) m
            JOIN users u ON u.id = m.partner_id
            WHERE m.rn = 1
            ORDER BY m.created_at DESC, m.seq DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load inbox: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<ConversationSummary> {
                Ok(ConversationSummary {
                    partner_id: parse_uuid(&r.get::<String, _>("partner_id"))?,
                    partner_name: r.get("partner_name"),
                    last_message: Self::row_to_message(r)?,
                    unread_count: r.get("unread_count"),
                })
            })
            .collect()
    }

    /// Number of unread messages addressed to the user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn unread_message_count(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND read_at IS NULL")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count messages: {e}")))
    }

    fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
        Ok(Message {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            sender_id: parse_uuid(&row.get::<String, _>("sender_id"))?,
            recipient_id: parse_uuid(&row.get::<String, _>("recipient_id"))?,
            body: row.get("body"),
            read_at: parse_opt_ts(row.get("read_at"))?,
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        })
    }
}
