// ABOUTME: Demo data seeder for local RunClub development
// ABOUTME: Creates an admin, a trainer, runners, a training plan, routes, runs, and follows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Demo data seeder for the RunClub server.
//!
//! Usage:
//! ```bash
//! # Seed the database named by DATABASE_URL
//! cargo run --bin seed-demo-data
//!
//! # Seed a specific database with a fixed random seed
//! cargo run --bin seed-demo-data -- --database-url sqlite:./data/demo.db --seed 7
//! ```
//!
//! Every demo account logs in with the password `DemoUser123!`. Seeding is
//! skipped when the demo trainer already exists.

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runclub_server::{
    auth::hash_password,
    config::environment::DEFAULT_DATABASE_URL,
    database::Database,
    models::{
        Follow, PlanAssignment, PlanDifficulty, PlanWeek, PlannedWorkout, RouteDifficulty, Run,
        RunningRoute, Surface, TrainingPlan, User, UserRole, WeeklyStructure, WorkoutKind,
    },
};
use std::env;
use tracing::info;
use uuid::Uuid;

/// Password shared by all demo accounts
const DEMO_USER_PASSWORD: &str = "DemoUser123!";

/// Low bcrypt cost; demo accounts are not meant to be secure
const DEMO_BCRYPT_COST: u32 = 4;

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "RunClub Demo Data Seeder",
    long_about = "Populate a database with demo users, a plan, routes, and runs"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Number of days of run history to generate
    #[arg(long, default_value = "30")]
    days: u32,

    /// Random seed for reproducible data
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

struct DemoUser {
    email: &'static str,
    display_name: &'static str,
    role: UserRole,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        email: "admin@runclub.dev",
        display_name: "Club Admin",
        role: UserRole::Admin,
    },
    DemoUser {
        email: "coach@runclub.dev",
        display_name: "Coach Morgan",
        role: UserRole::Trainer,
    },
    DemoUser {
        email: "alice@runclub.dev",
        display_name: "Alice Johnson",
        role: UserRole::Runner,
    },
    DemoUser {
        email: "bob@runclub.dev",
        display_name: "Bob Smith",
        role: UserRole::Runner,
    },
    DemoUser {
        email: "chen@runclub.dev",
        display_name: "Chen Wei",
        role: UserRole::Runner,
    },
];

const TRAINER_EMAIL: &str = "coach@runclub.dev";

fn workout(day: &str, kind: WorkoutKind, description: &str, distance_km: Option<f64>) -> PlannedWorkout {
    PlannedWorkout {
        day: Some(day.to_owned()),
        kind,
        description: description.to_owned(),
        distance_km,
        duration_minutes: None,
    }
}

fn five_k_structure() -> WeeklyStructure {
    let weeks = (1..=4)
        .map(|week| {
            let easy = 2.0 + f64::from(week) * 0.5;
            PlanWeek {
                week,
                focus: Some(if week < 4 { "Build" } else { "Taper" }.to_owned()),
                workouts: vec![
                    workout("tuesday", WorkoutKind::EasyRun, "Easy conversational run", Some(easy)),
                    workout("thursday", WorkoutKind::Intervals, "6 x 400m at 5K effort", Some(4.0)),
                    workout("sunday", WorkoutKind::LongRun, "Long run, relaxed pace", Some(easy * 2.0)),
                ],
            }
        })
        .collect();
    WeeklyStructure { weeks }
}

fn demo_routes(creator_id: Uuid) -> Vec<RunningRoute> {
    let now = Utc::now();
    vec![
        RunningRoute {
            id: Uuid::new_v4(),
            creator_id,
            name: "Riverside Loop".to_owned(),
            description: Some("Flat paved loop along the river".to_owned()),
            location: Some("City Park".to_owned()),
            distance_km: 5.0,
            elevation_gain_m: 15.0,
            difficulty: RouteDifficulty::Easy,
            surface: Surface::Road,
            created_at: now,
        },
        RunningRoute {
            id: Uuid::new_v4(),
            creator_id,
            name: "Ridge Trail".to_owned(),
            description: Some("Rolling singletrack with one steep climb".to_owned()),
            location: Some("North Hills".to_owned()),
            distance_km: 10.0,
            elevation_gain_m: 320.0,
            difficulty: RouteDifficulty::Hard,
            surface: Surface::Trail,
            created_at: now,
        },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("=== RunClub Demo Data Seeder ===");

    let database_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
    info!("Connecting to database: {}", database_url);
    let database = Database::new(&database_url).await?;

    if database.get_user_by_email(TRAINER_EMAIL).await?.is_some() {
        info!("Demo data already present, nothing to do");
        return Ok(());
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let password_hash = hash_password(DEMO_USER_PASSWORD, DEMO_BCRYPT_COST)?;

    let mut trainer_id = None;
    let mut runner_ids = Vec::new();
    for demo in DEMO_USERS {
        let user = User::new(
            demo.email,
            password_hash.clone(),
            demo.display_name.to_owned(),
            demo.role,
        );
        database.create_user(&user).await?;
        info!("Created {} {}", demo.role.as_str(), demo.email);
        match demo.role {
            UserRole::Trainer => trainer_id = Some(user.id),
            UserRole::Runner => runner_ids.push(user.id),
            _ => {}
        }
    }
    let trainer_id = trainer_id.ok_or_else(|| anyhow::anyhow!("Demo users contain no trainer"))?;

    let now = Utc::now();
    let plan = TrainingPlan {
        id: Uuid::new_v4(),
        trainer_id,
        title: "First 5K".to_owned(),
        description: Some("Four weeks from couch to a confident 5K".to_owned()),
        difficulty: PlanDifficulty::Beginner,
        duration_weeks: 4,
        weekly_structure: five_k_structure(),
        is_public: true,
        created_at: now,
        updated_at: now,
    };
    database.create_plan(&plan).await?;
    info!("Created plan '{}'", plan.title);

    if let Some(&first_runner) = runner_ids.first() {
        let assignment = PlanAssignment::new(plan.id, first_runner, trainer_id, now.date_naive());
        database.create_assignment(&assignment).await?;
        info!("Assigned plan to runner {}", first_runner);
    }

    let routes = demo_routes(trainer_id);
    for route in &routes {
        database.create_route(route).await?;
        info!("Created route '{}'", route.name);
    }

    let mut run_count = 0;
    for &runner_id in &runner_ids {
        let pace_seconds_per_km: f64 = rng.gen_range(270.0..390.0);
        for day in (1..=i64::from(args.days)).rev() {
            if !rng.gen_bool(0.4) {
                continue;
            }
            let route = &routes[rng.gen_range(0..routes.len())];
            let on_route = rng.gen_bool(0.6);
            let distance_km = if on_route {
                route.distance_km
            } else {
                rng.gen_range(3.0..15.0_f64).round()
            };
            let jitter: f64 = rng.gen_range(0.93..1.07);
            let started_at = now - Duration::days(day) + Duration::minutes(rng.gen_range(0..120));
            let run = Run {
                id: Uuid::new_v4(),
                user_id: runner_id,
                route_id: on_route.then_some(route.id),
                distance_km,
                duration_seconds: (distance_km * pace_seconds_per_km * jitter).round() as i64,
                elevation_gain_m: if on_route { route.elevation_gain_m } else { 0.0 },
                started_at,
                notes: None,
                created_at: started_at,
            };
            database.create_run(&run).await?;
            run_count += 1;
        }
    }
    info!("Created {} runs", run_count);

    // Every runner follows every other runner
    let mut follow_count = 0;
    for &follower in &runner_ids {
        for &followed in runner_ids.iter().filter(|&&id| id != follower) {
            let follow = Follow::request(follower, followed);
            database.create_follow(&follow).await?;
            database.approve_follow(follow.id, now).await?;
            follow_count += 1;
        }
    }
    info!("Created {} approved follows", follow_count);

    info!("=== Seeding complete; log in with password {} ===", DEMO_USER_PASSWORD);
    Ok(())
}
