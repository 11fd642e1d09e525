// ABOUTME: RunClub HTTP server binary
// ABOUTME: Loads environment configuration, initializes logging and the database, then serves the API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # RunClub Server Binary
//!
//! Reads `.env` when present, then the process environment. `--http-port`
//! overrides `HTTP_PORT`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use runclub_server::{
    config::environment::ServerConfig, logging, resources::ServerResources, server::RunClubServer,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "runclub-server")]
#[command(about = "RunClub - training plans, run logging, and social features for runners and trainers")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!("Starting RunClub server");
    info!("{}", config.summary());
    if config.auth.jwt_secret_generated {
        warn!("Using a generated JWT secret; set JWT_SECRET to keep sessions across restarts");
    }

    let resources = Arc::new(ServerResources::from_config(config).await?);
    info!("Server resources initialized");

    if let Err(e) = RunClubServer::new(resources).run().await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}
