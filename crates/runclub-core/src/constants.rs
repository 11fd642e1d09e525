// ABOUTME: Application constants, validation limits, and defaults organized by domain
// ABOUTME: Shared by request validation, database queries, and configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Service identity
pub mod service_names {
    /// Service name used in logs and as the JWT audience
    pub const RUNCLUB_SERVER: &str = "runclub-server";
}

/// Authentication and session limits
pub mod auth {
    /// Cookie carrying the session token
    pub const SESSION_COOKIE: &str = "auth_token";
    /// Minimum password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    /// Maximum password length (bcrypt truncates at 72 bytes)
    pub const MAX_PASSWORD_LENGTH: usize = 72;
    /// Maximum display name length
    pub const MAX_DISPLAY_NAME_LENGTH: usize = 80;
    /// Default session lifetime
    pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
    /// Upper bound for configured session lifetime
    pub const MAX_JWT_EXPIRY_HOURS: i64 = 720;
}

/// Profile field limits
pub mod profiles {
    /// Maximum bio length
    pub const MAX_BIO_LENGTH: usize = 1000;
    /// Maximum location length
    pub const MAX_LOCATION_LENGTH: usize = 120;
    /// Maximum weekly distance goal in kilometers
    pub const MAX_WEEKLY_GOAL_KM: f64 = 500.0;
}

/// Training plan limits
pub mod plans {
    /// Longest plan in weeks
    pub const MAX_DURATION_WEEKS: u32 = 52;
    /// Maximum plan title length
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum plan description length
    pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
}

/// Run logging limits
pub mod runs {
    /// Maximum distance of a single run in kilometers
    pub const MAX_DISTANCE_KM: f64 = 1000.0;
    /// Maximum duration of a single run (7 days)
    pub const MAX_DURATION_SECONDS: i64 = 7 * 24 * 3600;
    /// Maximum elevation gain of a single run in meters
    pub const MAX_ELEVATION_GAIN_M: f64 = 20_000.0;
    /// Clock skew tolerated for `started_at` in the future
    pub const FUTURE_TOLERANCE_SECONDS: i64 = 300;
    /// Maximum notes length
    pub const MAX_NOTES_LENGTH: usize = 2000;
    /// Runs shown on the runner dashboard
    pub const DASHBOARD_RECENT_RUNS: i64 = 5;
}

/// Route catalog limits
pub mod routes {
    /// Lowest star rating
    pub const MIN_RATING: i64 = 1;
    /// Highest star rating
    pub const MAX_RATING: i64 = 5;
    /// Maximum review length
    pub const MAX_REVIEW_LENGTH: usize = 1000;
    /// Maximum route name length
    pub const MAX_NAME_LENGTH: usize = 200;
    /// Default leaderboard size
    pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;
    /// Largest leaderboard a client may request
    pub const MAX_LEADERBOARD_SIZE: usize = 50;
    /// Maximum photo caption length
    pub const MAX_CAPTION_LENGTH: usize = 300;
}

/// Forum limits
pub mod forum {
    /// Minimum post title length
    pub const MIN_TITLE_LENGTH: usize = 3;
    /// Maximum post title length
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum post body length
    pub const MAX_BODY_LENGTH: usize = 10_000;
    /// Maximum comment length
    pub const MAX_COMMENT_LENGTH: usize = 5000;
}

/// Messaging limits
pub mod messages {
    /// Maximum message body length
    pub const MAX_BODY_LENGTH: usize = 5000;
}

/// Safety alert limits
pub mod safety {
    /// Default alert lifetime
    pub const DEFAULT_EXPIRY_HOURS: i64 = 48;
    /// Window for notifying recent route users
    pub const RECENT_ROUTE_USER_DAYS: i64 = 30;
    /// Minimum alert title length
    pub const MIN_TITLE_LENGTH: usize = 3;
    /// Maximum alert title length
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum alert description length
    pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
}

/// Pagination defaults
pub mod pagination {
    /// Default page size
    pub const DEFAULT_PAGE_SIZE: i64 = 20;
    /// Largest page a client may request
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Clamp a requested page size into `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn clamp_limit(limit: Option<i64>) -> i64 {
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Clamp a requested offset to be non-negative
    #[must_use]
    pub fn clamp_offset(offset: Option<i64>) -> i64 {
        offset.unwrap_or(0).max(0)
    }
}

/// Upload defaults
pub mod uploads {
    /// Default upload size limit (5 MiB)
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
    /// Accepted image content types and the extension stored on disk
    pub const IMAGE_TYPES: &[(&str, &str)] = &[
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
    ];
}
