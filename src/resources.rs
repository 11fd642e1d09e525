// ABOUTME: Centralized resource container shared by every router
// ABOUTME: Holds the database, auth manager and middleware, configuration, and upload storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once at startup and handed to routers as `Arc<ServerResources>`, so
//! handlers never recreate the auth manager or open new pools.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::middleware::AuthMiddleware;
use crate::storage::{FileStorage, LocalFileStorage};

/// Shared server state
#[derive(Clone)]
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// Token issuer and validator
    pub auth_manager: Arc<AuthManager>,
    /// Request authenticator
    pub auth_middleware: Arc<AuthMiddleware>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Upload storage
    pub storage: Arc<dyn FileStorage>,
}

impl ServerResources {
    /// Assemble resources from already constructed parts
    #[must_use]
    pub fn new(database: Database, config: ServerConfig, storage: Arc<dyn FileStorage>) -> Self {
        let database = Arc::new(database);
        let auth_manager = Arc::new(AuthManager::new(
            &config.auth.jwt_secret,
            config.auth.jwt_expiry_hours,
        ));
        let auth_middleware = Arc::new(AuthMiddleware::new(
            auth_manager.clone(),
            database.clone(),
        ));

        Self {
            database,
            auth_manager,
            auth_middleware,
            config: Arc::new(config),
            storage,
        }
    }

    /// Connect to the configured database and upload directory
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or the
    /// upload directory cannot be created
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url).await?;
        let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(config.uploads.dir.clone()).await?);
        Ok(Self::new(database, config, storage))
    }
}
