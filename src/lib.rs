pub mod analytics;
pub mod brain;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

use std::sync::Arc;
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use crate::cli::{Cli, Commands};
use crate::state::{AppState, Clock, EngineContext};

pub use crate::error::{CoachError, ErrorKind};

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize structured logging first
    logging::init_logging();
    tracing::info!("habit-coach starting");

    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::get_coach_config().clone(),
    };
    let data_file = cli.data.clone().unwrap_or_else(|| config.storage.data_file());

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async move {
        let store = Arc::new(store::JsonStore::open(&data_file).await?);

        let mut context = EngineContext::new(config.thresholds.clone());
        if let Some(today) = cli.today {
            context = context.with_clock(Clock::Fixed(today));
        }
        let state = AppState::new(store, context);

        let output = dispatch(&state, cli.command, cli.compact)
            .await
            .map_err(anyhow::Error::msg)?;
        println!("{}", output);

        tracing::debug!(metrics = ?routes::get_metrics(&state), "Command finished");
        Ok::<(), anyhow::Error>(())
    })
}

/// Run one command and render its result as JSON
pub async fn dispatch(state: &AppState, command: Commands, compact: bool) -> Result<String, String> {
    match command {
        Commands::Recommend { user } => {
            render(&routes::get_recommendations(state, user).await?, compact)
        }
        Commands::Habit { user, habit } => {
            render(&routes::get_habit_recommendations(state, user, habit).await?, compact)
        }
        Commands::Failures { user, days } => {
            render(&routes::get_failure_analysis(state, user, days).await?, compact)
        }
        Commands::Weekly { user, week } => {
            render(&routes::generate_weekly_recommendations(state, user, &week).await?, compact)
        }
        Commands::Week { user, week } => {
            render(&routes::get_week_overview(state, user, &week).await?, compact)
        }
        Commands::Pending { user, limit } => {
            render(&routes::get_pending_recommendations(state, user, limit).await?, compact)
        }
        Commands::Act { user, week, habit, recommendation_type } => render(
            &routes::mark_recommendation_acted_upon(state, user, &week, habit, &recommendation_type).await?,
            compact,
        ),
    }
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    rendered.map_err(|e| format!("Failed to serialize output: {}", e))
}
