use anyhow::Result;
use clap::{Parser, Subcommand};
use llm_eval_core::{ExperimentId, RunId};
use llm_eval_storage::{PgStore, PostgresConfig};
use llm_eval_workflow::{load_run_summary, ExperimentRunner};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::{LabConfig, LogFormat};

/// Run LLM evaluation experiments against hosted models
#[derive(Debug, Parser)]
#[command(name = "llm-eval-lab", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute every test case of an experiment and record a new run
    Run {
        /// Experiment ID
        experiment_id: ExperimentId,
    },

    /// Apply database migrations
    Migrate,

    /// Show a recorded run with its results and score statistics
    Summary {
        /// Run ID
        run_id: RunId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = LabConfig::load()?;

    init_tracing(config.log_format);

    let store = PgStore::connect(&PostgresConfig::new(config.database_url.clone())).await?;
    store.health_check().await?;
    tracing::info!("Database pool initialized");

    match cli.command {
        Command::Migrate => {
            store.migrate().await?;
            tracing::info!("Migrations applied");
        }
        Command::Run { experiment_id } => {
            let runner = ExperimentRunner::new(Arc::new(store), config.graders()?)
                .with_max_concurrency(config.max_concurrency)
                .with_provider_settings(config.provider_settings());

            runner.initialize_providers().await?;
            let summary = runner.run_experiment(&experiment_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Summary { run_id } => {
            let summary = load_run_summary(&store, &run_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "llm_eval=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
