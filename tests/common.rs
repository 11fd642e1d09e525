// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Builds an in-memory server with a temporary upload directory and issues user tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `runclub_server`

use std::path::PathBuf;
use std::sync::{Arc, Once};

use axum::Router;
use chrono::{Duration, Utc};
use runclub_server::{
    auth::hash_password,
    config::environment::{AuthConfig, Environment, ServerConfig, UploadConfig},
    database::Database,
    models::{
        PlanDifficulty, PlanWeek, PlannedWorkout, RouteDifficulty, Run, RunningRoute, Surface,
        TrainingPlan, User, UserRole, WeeklyStructure, WorkoutKind,
    },
    resources::ServerResources,
    routes::build_router,
    storage::{FileStorage, LocalFileStorage},
};
use tempfile::TempDir;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Password given to every user created through these helpers
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Lowest bcrypt cost so tests stay fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration for tests: in-memory database, given upload dir
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        host: "127.0.0.1".to_owned(),
        database_url: "sqlite::memory:".to_owned(),
        environment: Environment::Testing,
        auth: AuthConfig {
            jwt_secret: b"runclub-integration-test-secret-with-enough-entropy".to_vec(),
            jwt_secret_generated: false,
            jwt_expiry_hours: 24,
            bcrypt_cost: TEST_BCRYPT_COST,
        },
        uploads: UploadConfig {
            dir: upload_dir,
            max_bytes: 1024 * 1024,
        },
        cors_allowed_origins: vec!["*".to_owned()],
        leaderboard_size: 10,
        request_timeout_secs: 30,
    }
}

/// Fully wired server over an in-memory database
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    // Held so the upload directory outlives the test
    _upload_dir: TempDir,
}

impl TestApp {
    /// Build resources and a fresh database
    pub async fn new() -> Self {
        init_test_logging();
        let upload_dir = TempDir::new().expect("Failed to create upload dir");
        let config = test_config(upload_dir.path().to_path_buf());
        let database = Database::new(&config.database_url)
            .await
            .expect("Failed to create test database");
        let storage: Arc<dyn FileStorage> = Arc::new(
            LocalFileStorage::new(config.uploads.dir.clone())
                .await
                .expect("Failed to create upload storage"),
        );

        Self {
            resources: Arc::new(ServerResources::new(database, config, storage)),
            _upload_dir: upload_dir,
        }
    }

    /// The complete application router
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Database handle
    pub fn db(&self) -> &Database {
        &self.resources.database
    }

    /// Insert an active user with the given role and return it with a session token
    pub async fn create_user(&self, name: &str, role: UserRole) -> (User, String) {
        let email = format!("{}-{}@runclub.test", name.to_lowercase(), Uuid::new_v4().simple());
        let hash = hash_password(TEST_PASSWORD, TEST_BCRYPT_COST).unwrap();
        let user = User::new(&email, hash, name.to_owned(), role);
        self.db().create_user(&user).await.unwrap();
        let token = self.resources.auth_manager.generate_token(&user).unwrap();
        (user, token)
    }

    /// Insert a plan with `weeks` weeks of `per_week` workouts
    pub async fn create_plan(&self, trainer_id: Uuid, weeks: u32, per_week: usize, is_public: bool) -> TrainingPlan {
        let now = Utc::now();
        let plan = TrainingPlan {
            id: Uuid::new_v4(),
            trainer_id,
            title: "Spring 10K".to_owned(),
            description: Some("Build to a strong 10K".to_owned()),
            difficulty: PlanDifficulty::Intermediate,
            duration_weeks: weeks,
            weekly_structure: weekly_structure(weeks, per_week),
            is_public,
            created_at: now,
            updated_at: now,
        };
        self.db().create_plan(&plan).await.unwrap();
        plan
    }

    /// Insert a route created by `creator_id`
    pub async fn create_route(&self, creator_id: Uuid, name: &str) -> RunningRoute {
        let route = RunningRoute {
            id: Uuid::new_v4(),
            creator_id,
            name: name.to_owned(),
            description: None,
            location: Some("Lakeside".to_owned()),
            distance_km: 5.0,
            elevation_gain_m: 40.0,
            difficulty: RouteDifficulty::Moderate,
            surface: Surface::Road,
            created_at: Utc::now(),
        };
        self.db().create_route(&route).await.unwrap();
        route
    }

    /// Insert a run that started `days_ago` days ago
    pub async fn create_run(
        &self,
        user_id: Uuid,
        route_id: Option<Uuid>,
        distance_km: f64,
        duration_seconds: i64,
        days_ago: i64,
    ) -> Run {
        let started_at = Utc::now() - Duration::days(days_ago);
        let run = Run {
            id: Uuid::new_v4(),
            user_id,
            route_id,
            distance_km,
            duration_seconds,
            elevation_gain_m: 0.0,
            started_at,
            notes: None,
            created_at: started_at,
        };
        self.db().create_run(&run).await.unwrap();
        run
    }
}

/// Weekly structure with numbered easy runs
pub fn weekly_structure(weeks: u32, per_week: usize) -> WeeklyStructure {
    WeeklyStructure {
        weeks: (1..=weeks)
            .map(|week| PlanWeek {
                week,
                focus: None,
                workouts: (0..per_week)
                    .map(|i| PlannedWorkout {
                        day: None,
                        kind: WorkoutKind::EasyRun,
                        description: format!("Week {week} run {}", i + 1),
                        distance_km: Some(5.0),
                        duration_minutes: None,
                    })
                    .collect(),
            })
            .collect(),
    }
}
