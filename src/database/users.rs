// ABOUTME: User account and profile database operations
// ABOUTME: Registration inserts the user and an empty profile in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, is_unique_violation, parse_enum, parse_opt_ts, parse_ts, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{normalize_email, Profile, User, UserRole};

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_ddl(
            &[
                r"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT NOT NULL UNIQUE,
                    display_name TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'runner'
                        CHECK (role IN ('runner', 'trainer', 'admin')),
                    is_active BOOLEAN NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    last_login_at TEXT
                )
                ",
                r"
                CREATE TABLE IF NOT EXISTS profiles (
                    user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                    bio TEXT,
                    location TEXT,
                    experience_level TEXT,
                    weekly_goal_km REAL,
                    avatar_path TEXT,
                    updated_at TEXT NOT NULL
                )
                ",
                "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
            ],
            "users",
        )
        .await
    }

    /// Create a user together with an empty profile
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_ALREADY_EXISTS` if the email is taken, or a database error
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, password_hash, role, is_active, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(user.id.to_string())
        .bind(normalize_email(&user.email))
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(fmt_ts(user.created_at))
        .bind(user.last_login_at.map(fmt_ts))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("An account with this email already exists")
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        sqlx::query("INSERT INTO profiles (user_id, updated_at) VALUES ($1, $2)")
            .bind(user.id.to_string())
            .bind(fmt_ts(user.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to create profile: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit user creation: {e}")))?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_impl("email", &normalize_email(email)).await
    }

    async fn get_user_impl(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!(
            r"
            SELECT id, email, display_name, password_hash, role, is_active, created_at, last_login_at
            FROM users WHERE {field} = $1
            "
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        Ok(User {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            password_hash: row.get("password_hash"),
            role: parse_enum(&row.get::<String, _>("role"))?,
            is_active: row.get("is_active"),
            created_at: parse_ts(&row.get::<String, _>("created_at"))?,
            last_login_at: parse_opt_ts(row.get("last_login_at"))?,
        })
    }

    /// Record a successful login
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn update_last_login(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(fmt_ts(Utc::now()))
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update last login: {e}")))?;
        Ok(())
    }

    /// Change a user's stored role
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` if the user does not exist
    pub async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update user role: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Activate or deactivate an account
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` if the user does not exist
    pub async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update user status: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Number of users per stored role
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_users_by_role(&self) -> AppResult<Vec<(UserRole, i64)>> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))?;

        rows.iter()
            .map(|r| -> AppResult<(UserRole, i64)> {
                Ok((parse_enum(&r.get::<String, _>("role"))?, r.get("count")))
            })
            .collect()
    }

    /// Get a user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(
            r"
            SELECT user_id, bio, location, experience_level, weekly_goal_km, avatar_path, updated_at
            FROM profiles WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map(|r| -> AppResult<Profile> {
            Ok(Profile {
                user_id: parse_uuid(&r.get::<String, _>("user_id"))?,
                bio: r.get("bio"),
                location: r.get("location"),
                experience_level: r
                    .get::<Option<String>, _>("experience_level")
                    .as_deref()
                    .map(parse_enum)
                    .transpose()?,
                weekly_goal_km: r.get("weekly_goal_km"),
                avatar_path: r.get("avatar_path"),
                updated_at: parse_ts(&r.get::<String, _>("updated_at"))?,
            })
        })
        .transpose()
    }

    /// Replace the editable profile fields
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn update_profile(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, bio, location, experience_level, weekly_goal_km, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(user_id) DO UPDATE SET
                bio = excluded.bio,
                location = excluded.location,
                experience_level = excluded.experience_level,
                weekly_goal_km = excluded.weekly_goal_km,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(profile.experience_level.map(|l| l.as_str()))
        .bind(profile.weekly_goal_km)
        .bind(fmt_ts(profile.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;
        Ok(())
    }

    /// Store a new avatar path and return the previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn set_avatar_path(&self, user_id: Uuid, path: &str) -> AppResult<Option<String>> {
        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT avatar_path FROM profiles WHERE user_id = $1")
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to read avatar: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO profiles (user_id, avatar_path, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT(user_id) DO UPDATE SET avatar_path = excluded.avatar_path, updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(path)
        .bind(fmt_ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update avatar: {e}")))?;

        Ok(previous.flatten())
    }
}
