use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dreamtrip_agents::{PlannerConfig, TripPlanner};
use dreamtrip_core::TripParameters;
use dreamtrip_integrations::{Collaborators, IntegrationConfig};
use dreamtrip_observability::{init_tracing, AppMetrics};
use dreamtrip_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "dreamtrip")]
#[command(about = "Turn a trip wish into a priced day-by-day plan")]
struct Cli {
    /// SQLite URL for the interaction history; memory when unset.
    #[arg(long, env = "DREAMTRIP_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract trip parameters from free text.
    Interpret { text: String },
    /// Generate a plan from a TripParameters JSON file.
    Generate {
        #[arg(long)]
        params: PathBuf,
    },
    /// Extract and generate in one go.
    Plan { text: String },
    /// Show recent interactions.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("dreamtrip_cli");
    let cli = Cli::parse();

    let planner = build_planner(cli.database_url.as_deref()).await?;

    match cli.command {
        Command::Interpret { text } => {
            let params = planner.interpret(&text).await;
            print_json(&params)?;
        }
        Command::Generate { params } => {
            let raw = fs::read_to_string(&params)
                .with_context(|| format!("failed reading {}", params.display()))?;
            let parsed: TripParameters = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid trip parameters", params.display()))?;
            let plan = planner.generate(parsed).await?;
            print_json(&plan)?;
        }
        Command::Plan { text } => {
            let plan = planner.plan(&text).await?;
            print_json(&plan)?;
        }
        Command::History { limit } => {
            let records = planner.history(limit).await?;
            print_json(&records)?;
        }
    }

    Ok(())
}

async fn build_planner(database_url: Option<&str>) -> Result<TripPlanner<Store>> {
    let collaborators = Collaborators::from_config(&IntegrationConfig::from_env())?;
    let store = Store::from_database_url(database_url)
        .await
        .context("failed to open context store")?;
    tracing::debug!(store = store.backend(), "context store opened");

    Ok(TripPlanner::new(
        collaborators,
        PlannerConfig::default(),
        Arc::new(store),
        AppMetrics::shared(),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
