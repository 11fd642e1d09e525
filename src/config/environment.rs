// ABOUTME: Environment-based configuration for the RunClub server
// ABOUTME: Reads ports, database URL, JWT, upload, CORS, and leaderboard settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-only configuration. There are no config files; every setting
//! has a default except `JWT_SECRET` in production.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rand::RngCore;
use tracing::{info, warn};

use crate::constants::{auth, routes, uploads};

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default `SQLite` database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/runclub.db";
/// Default upload directory
pub const DEFAULT_UPLOAD_DIR: &str = "./data/uploads";
/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Session and password settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: Vec<u8>,
    /// Whether the secret was generated at startup (sessions die on restart)
    pub jwt_secret_generated: bool,
    /// Session lifetime
    pub jwt_expiry_hours: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_secret_generated", &self.jwt_secret_generated)
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Upload storage settings
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root directory for uploaded files
    pub dir: PathBuf,
    /// Largest accepted upload
    pub max_bytes: usize,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// sqlx database URL
    pub database_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Session settings
    pub auth: AuthConfig,
    /// Upload settings
    pub uploads: UploadConfig,
    /// Allowed CORS origins, `*` for any
    pub cors_allowed_origins: Vec<String>,
    /// Default route leaderboard size
    pub leaderboard_size: usize,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value or `JWT_SECRET`
    /// is missing in production
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let environment =
            Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let config = Self {
            http_port: env_parse_or("HTTP_PORT", DEFAULT_HTTP_PORT)?,
            host: env_var_or("HOST", DEFAULT_HOST),
            database_url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            environment,
            auth: AuthConfig::from_env(environment)?,
            uploads: UploadConfig {
                dir: PathBuf::from(env_var_or("UPLOAD_DIR", DEFAULT_UPLOAD_DIR)),
                max_bytes: env_parse_or("MAX_UPLOAD_BYTES", uploads::DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            cors_allowed_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
            leaderboard_size: env_parse_or("LEADERBOARD_SIZE", routes::DEFAULT_LEADERBOARD_SIZE)?,
            request_timeout_secs: env_parse_or(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that parsing alone cannot
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.uploads.max_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        if !(1..=routes::MAX_LEADERBOARD_SIZE).contains(&self.leaderboard_size) {
            bail!(
                "LEADERBOARD_SIZE must be between 1 and {}",
                routes::MAX_LEADERBOARD_SIZE
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if !(1..=auth::MAX_JWT_EXPIRY_HOURS).contains(&self.auth.jwt_expiry_hours) {
            bail!(
                "JWT_EXPIRY_HOURS must be between 1 and {}",
                auth::MAX_JWT_EXPIRY_HOURS
            );
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        Ok(())
    }

    /// One-line configuration summary without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "RunClub Server Configuration: env={} bind={}:{} database={} jwt_expiry_hours={} \
             jwt_secret={} bcrypt_cost={} upload_dir={} max_upload_bytes={} cors={} \
             leaderboard_size={} request_timeout_secs={}",
            self.environment,
            self.host,
            self.http_port,
            redact_database_url(&self.database_url),
            self.auth.jwt_expiry_hours,
            if self.auth.jwt_secret_generated {
                "generated"
            } else {
                "configured"
            },
            self.auth.bcrypt_cost,
            self.uploads.dir.display(),
            self.uploads.max_bytes,
            self.cors_allowed_origins.join(","),
            self.leaderboard_size,
            self.request_timeout_secs,
        )
    }
}

impl AuthConfig {
    fn from_env(environment: Environment) -> Result<Self> {
        let (jwt_secret, jwt_secret_generated) = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => (secret.into_bytes(), false),
            _ if environment.is_production() => {
                bail!("JWT_SECRET must be set in production");
            }
            _ => {
                warn!("JWT_SECRET not set, generating an ephemeral secret; sessions will not survive a restart");
                (generate_jwt_secret().to_vec(), true)
            }
        };

        Ok(Self {
            jwt_secret,
            jwt_secret_generated,
            jwt_expiry_hours: env_parse_or("JWT_EXPIRY_HOURS", auth::DEFAULT_JWT_EXPIRY_HOURS)?,
            bcrypt_cost: env_parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

/// Random 64-byte signing secret
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
///
/// # Errors
///
/// Returns an error when the variable is set but does not parse
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {key}: '{raw}'")),
        _ => Ok(default),
    }
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Hide credentials embedded in a database URL
fn redact_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://[REDACTED]{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://runclub.app,"),
            vec!["http://localhost:3000", "https://runclub.app"]
        );
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
        assert_eq!(
            Environment::from_str_or_default("whatever"),
            Environment::Development
        );
    }

    #[test]
    fn test_redact_database_url() {
        assert_eq!(
            redact_database_url("postgres://user:pw@db:5432/runclub"),
            "postgres://[REDACTED]@db:5432/runclub"
        );
        assert_eq!(
            redact_database_url("sqlite:./data/runclub.db"),
            "sqlite:./data/runclub.db"
        );
    }

    #[test]
    fn test_generated_secrets_differ() {
        assert_ne!(generate_jwt_secret(), generate_jwt_secret());
    }
}
