// ABOUTME: Cursor-based pagination for the activity feed and forum listings
// ABOUTME: Provides opaque cursor encoding over (timestamp, id) keyset positions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::pagination::clamp_limit;
use crate::errors::{AppError, AppResult};

/// Opaque pagination cursor containing encoded position information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encode a keyset position as `base64url("<millis>:<id>")`
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, id: &str) -> Self {
        let cursor_data = format!("{}:{}", timestamp.timestamp_millis(), id);
        let encoded = base64::Engine::encode(&URL_SAFE_NO_PAD, cursor_data.as_bytes());
        Self(encoded)
    }

    /// Decode cursor into timestamp and ID components
    ///
    /// Returns `None` if cursor is invalid or malformed
    #[must_use]
    pub fn decode(&self) -> Option<(DateTime<Utc>, String)> {
        let decoded = base64::Engine::decode(&URL_SAFE_NO_PAD, &self.0).ok()?;
        let decoded_str = String::from_utf8(decoded).ok()?;

        // Split on first ':' only so IDs containing ':' are preserved
        let (timestamp_str, id) = decoded_str.split_once(':')?;

        let timestamp_millis = timestamp_str.parse::<i64>().ok()?;
        let datetime = DateTime::from_timestamp_millis(timestamp_millis)?;

        Some((datetime, id.to_owned()))
    }

    /// Create cursor from raw string (for deserialization)
    #[must_use]
    pub const fn from_string(s: String) -> Self {
        Self(s)
    }
}

/// Paginated response containing items and pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    /// The items in this page
    pub items: Vec<T>,

    /// Cursor pointing to the next (older) page, if any
    pub next_cursor: Option<Cursor>,

    /// Whether there are more items after this page
    pub has_more: bool,

    /// Total number of items in this page
    pub count: usize,
}

impl<T> CursorPage<T> {
    /// Build a page from `limit + 1` fetched rows
    ///
    /// Queries fetch one extra row to learn whether another page exists; the
    /// extra row is dropped here and the cursor points at the last kept item.
    pub fn from_overfetched(
        mut items: Vec<T>,
        limit: i64,
        key: impl Fn(&T) -> (DateTime<Utc>, String),
    ) -> Self {
        let limit = usize::try_from(limit).unwrap_or(0);
        let has_more = items.len() > limit;
        items.truncate(limit);
        let next_cursor = if has_more {
            items.last().map(|item| {
                let (timestamp, id) = key(item);
                Cursor::new(timestamp, &id)
            })
        } else {
            None
        };
        let count = items.len();
        Self {
            items,
            next_cursor,
            has_more,
            count,
        }
    }
}

/// Pagination parameters for newest-first keyset queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParams {
    /// Position to continue after (exclusive)
    pub after: Option<(DateTime<Utc>, String)>,

    /// Maximum number of items to return
    pub limit: i64,
}

impl PaginationParams {
    /// Parse raw query values into pagination parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be decoded
    pub fn parse(cursor: Option<&str>, limit: Option<i64>) -> AppResult<Self> {
        let after = match cursor.filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                Cursor::from_string(raw.to_owned())
                    .decode()
                    .ok_or_else(|| AppError::invalid_input("Invalid pagination cursor"))?,
            ),
            None => None,
        };
        Ok(Self {
            after,
            limit: clamp_limit(limit),
        })
    }

    /// Number of rows a query should fetch to detect a following page
    #[must_use]
    pub const fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }
}
